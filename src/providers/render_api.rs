use async_trait::async_trait;
use log::{debug, error};
use reqwest::{Client, header};
use std::time::Duration;

use crate::app_config::RenderConfig;
use crate::errors::{ProviderError, truncate_chars};
use crate::providers::{JobStatus, RenderProvider, RenderRequest, extract_job_id};

/// Longest excerpt of an error body carried in `ProviderError::ApiError`
pub const ERROR_BODY_MAX_CHARS: usize = 300;

/// Client for the remote video rendering API
pub struct RenderApi {
    /// HTTP client for API requests
    client: Client,
    /// Base URL, without trailing slash
    base_url: String,
    /// Bearer credential
    api_key: String,
    /// Path of the submission endpoint
    submit_path: String,
    /// Path prefix of the status endpoint; the job id is appended
    status_path: String,
    /// Per-request timeout for submissions
    submit_timeout: Duration,
    /// Per-request timeout for status checks
    status_timeout: Duration,
}

impl std::fmt::Debug for RenderApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderApi")
            .field("base_url", &self.base_url)
            .field("submit_path", &self.submit_path)
            .field("status_path", &self.status_path)
            .finish_non_exhaustive()
    }
}

impl RenderApi {
    /// Create a client with the default endpoints and timeouts
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let config = RenderConfig {
            api_base: base_url.into(),
            api_key: api_key.into(),
            ..RenderConfig::default()
        };
        Self::from_config(&config)
    }

    /// Create a client from the `render` configuration section
    pub fn from_config(config: &RenderConfig) -> Self {
        Self {
            client: Client::builder()
                .pool_idle_timeout(Duration::from_secs(90))
                .build()
                .unwrap_or_default(),
            base_url: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            submit_path: normalize_path(&config.submit_path),
            status_path: normalize_path(&config.status_path),
            submit_timeout: Duration::from_secs(config.submit_timeout_secs),
            status_timeout: Duration::from_secs(config.status_timeout_secs),
        }
    }

    fn submit_url(&self) -> String {
        format!("{}{}", self.base_url, self.submit_path)
    }

    fn status_url(&self, job_id: &str) -> String {
        format!("{}{}/{}", self.base_url, self.status_path, job_id)
    }

    /// Authorize and send a prepared request, decoding the JSON body of a successful answer.
    ///
    /// `.json()` already sets the content type on submissions.
    async fn send_json(
        &self,
        request: reqwest::RequestBuilder,
        operation: &str,
    ) -> Result<serde_json::Value, ProviderError> {
        let response = request
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(format!("{} request failed: {}", operation, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::ConnectionError(format!("Failed to read {} response: {}", operation, e)))?;

        if status.as_u16() >= 400 {
            error!("Render API {} error ({}): {}", operation, status, truncate_chars(&body, ERROR_BODY_MAX_CHARS));
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message: truncate_chars(&body, ERROR_BODY_MAX_CHARS),
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            ProviderError::UnexpectedResponse(format!(
                "{} returned invalid JSON ({}): {}",
                operation,
                e,
                truncate_chars(&body, ERROR_BODY_MAX_CHARS)
            ))
        })
    }
}

fn normalize_path(path: &str) -> String {
    let trimmed = path.trim().trim_end_matches('/');
    if trimmed.is_empty() || trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

#[async_trait]
impl RenderProvider for RenderApi {
    async fn create_job(&self, request: &RenderRequest) -> Result<String, ProviderError> {
        debug!(
            "Submitting render job: style={}, aspect={}, duration={}s, {} asset(s)",
            request.style,
            request.aspect_ratio,
            request.duration,
            request.assets.len()
        );

        let builder = self
            .client
            .post(self.submit_url())
            .timeout(self.submit_timeout)
            .json(request);
        let payload = self.send_json(builder, "create job").await?;

        extract_job_id(&payload).ok_or_else(|| {
            ProviderError::UnexpectedResponse(format!("no job identifier in {}", payload))
        })
    }

    async fn job_status(&self, job_id: &str) -> Result<JobStatus, ProviderError> {
        let builder = self
            .client
            .get(self.status_url(job_id))
            .header(header::CONTENT_TYPE, "application/json")
            .timeout(self.status_timeout);
        let payload = self.send_json(builder, "get job").await?;

        debug!("Job {} status payload: {}", job_id, payload);
        Ok(JobStatus::new(payload))
    }
}
