/*!
 * Provider implementations for the video rendering service.
 *
 * This module contains:
 * - `render_api`: HTTP client for the remote rendering API
 * - `mock`: scripted provider for tests and offline runs
 */

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::errors::ProviderError;
use crate::session::models::AspectRatio;

pub mod mock;
pub mod render_api;

/// Asset reference included in a render request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRef {
    pub url: String,
}

/// Body of a job submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderRequest {
    /// Narrative script to render
    pub prompt: String,
    /// Visual style; the campaign tone is sent here
    pub style: String,
    /// Output frame, e.g. "9:16"
    pub aspect_ratio: AspectRatio,
    /// Video length in seconds
    pub duration: u32,
    /// Logos and photos to include
    pub assets: Vec<AssetRef>,
}

impl RenderRequest {
    /// Create a request without assets
    pub fn new(
        prompt: impl Into<String>,
        style: impl Into<String>,
        aspect_ratio: AspectRatio,
        duration: u32,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            style: style.into(),
            aspect_ratio,
            duration,
            assets: Vec::new(),
        }
    }

    /// Attach asset URLs, preserving their order
    pub fn with_assets<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.assets
            .extend(urls.into_iter().map(|url| AssetRef { url: url.into() }));
        self
    }
}

/// Status payload of a submitted job.
///
/// The full JSON document is kept so a failure can be reported verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct JobStatus {
    pub payload: serde_json::Value,
}

impl JobStatus {
    pub fn new(payload: serde_json::Value) -> Self {
        Self { payload }
    }

    /// Lower-cased `status` field, empty when absent
    pub fn status(&self) -> String {
        self.payload
            .get("status")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_lowercase()
    }

    pub fn is_completed(&self) -> bool {
        self.status() == "completed"
    }

    /// `failed`, `error` or `canceled`
    pub fn is_failed(&self) -> bool {
        matches!(self.status().as_str(), "failed" | "error" | "canceled")
    }

    /// Output URL of a completed job, `output_url` first, then `video_url`
    pub fn output_url(&self) -> Option<String> {
        ["output_url", "video_url"].iter().find_map(|key| {
            self.payload
                .get(*key)
                .and_then(|v| v.as_str())
                .filter(|url| !url.is_empty())
                .map(str::to_string)
        })
    }
}

/// Extract the job identifier from a submission response, `job_id` first, then `id`.
///
/// Numeric identifiers are rendered in decimal.
pub fn extract_job_id(payload: &serde_json::Value) -> Option<String> {
    ["job_id", "id"].iter().find_map(|key| match payload.get(*key)? {
        serde_json::Value::String(id) if !id.is_empty() => Some(id.clone()),
        serde_json::Value::Number(id) => Some(id.to_string()),
        _ => None,
    })
}

/// Common trait for rendering service clients
#[async_trait]
pub trait RenderProvider: Send + Sync + Debug {
    /// Submit a job and return its identifier
    async fn create_job(&self, request: &RenderRequest) -> Result<String, ProviderError>;

    /// Fetch the current status of a job
    async fn job_status(&self, job_id: &str) -> Result<JobStatus, ProviderError>;
}
