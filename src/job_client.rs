/*!
 * Video job client.
 *
 * Submits a render job, then polls its status until a terminal state or the
 * hard timeout. Each network call is wrapped in its own retry policy; the wait
 * loop itself is not retried.
 */

use async_trait::async_trait;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::errors::{JobError, ProviderError};
use crate::providers::{JobStatus, RenderProvider, RenderRequest};
use crate::retry::{RetryPolicy, retry_async};

/// Interval schedule of the wait-for-completion loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollSchedule {
    /// First sleep between status checks in milliseconds
    pub initial_interval_ms: u64,
    /// Growth factor applied after every sleep
    pub multiplier: f64,
    /// Longest sleep between status checks in milliseconds
    pub max_interval_ms: u64,
    /// Give up waiting after this many seconds
    pub hard_timeout_secs: u64,
}

impl Default for PollSchedule {
    fn default() -> Self {
        Self {
            initial_interval_ms: 5_000,
            multiplier: 1.5,
            max_interval_ms: 20_000,
            hard_timeout_secs: 900,
        }
    }
}

impl PollSchedule {
    pub fn hard_timeout(&self) -> Duration {
        Duration::from_secs(self.hard_timeout_secs)
    }

    /// Interval following `current`
    pub fn next_interval(&self, current: Duration) -> Duration {
        let next = current.as_millis() as f64 * self.multiplier;
        Duration::from_millis(next.min(self.max_interval_ms as f64) as u64)
    }
}

/// Anything able to turn a render request into a finished video URL
#[async_trait]
pub trait VideoRenderer: Send + Sync {
    /// Submit `request` and wait for the output URL
    async fn render(&self, request: &RenderRequest) -> Result<String, JobError>;
}

/// Submits jobs to a rendering provider and waits for their completion
#[derive(Debug, Clone)]
pub struct JobClient {
    provider: Arc<dyn RenderProvider>,
    submit_policy: RetryPolicy,
    status_policy: RetryPolicy,
    schedule: PollSchedule,
}

impl JobClient {
    /// Client with the default retry policies and poll schedule
    pub fn new(provider: Arc<dyn RenderProvider>) -> Self {
        Self {
            provider,
            submit_policy: RetryPolicy::submission(),
            status_policy: RetryPolicy::status_check(),
            schedule: PollSchedule::default(),
        }
    }

    pub fn with_submit_policy(mut self, policy: RetryPolicy) -> Self {
        self.submit_policy = policy;
        self
    }

    pub fn with_status_policy(mut self, policy: RetryPolicy) -> Self {
        self.status_policy = policy;
        self
    }

    pub fn with_schedule(mut self, schedule: PollSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn schedule(&self) -> &PollSchedule {
        &self.schedule
    }

    /// Submit a render job and return its identifier
    pub async fn submit(&self, request: &RenderRequest) -> Result<String, JobError> {
        let policy = &self.submit_policy;
        let job_id = retry_async(
            policy,
            "Render job submission",
            |e: &ProviderError| policy.retry_client_errors || e.is_transient(),
            || self.provider.create_job(request),
        )
        .await?;

        info!("Render job {} accepted", job_id);
        Ok(job_id)
    }

    /// Fetch the current status of a job
    pub async fn check_status(&self, job_id: &str) -> Result<JobStatus, JobError> {
        let policy = &self.status_policy;
        let status = retry_async(
            policy,
            "Render job status check",
            |e: &ProviderError| policy.retry_client_errors || e.is_transient(),
            || self.provider.job_status(job_id),
        )
        .await?;

        Ok(status)
    }

    /// Poll until the job reaches a terminal status or `hard_timeout` elapses.
    ///
    /// Returns the output URL of a completed job. Status check failures that
    /// survive their own retry policy end the wait immediately.
    pub async fn wait_for_completion(&self, job_id: &str, hard_timeout: Duration) -> Result<String, JobError> {
        let started = Instant::now();
        let mut interval = Duration::from_millis(self.schedule.initial_interval_ms);

        while started.elapsed() < hard_timeout {
            let status = self.check_status(job_id).await?;

            if status.is_completed() {
                return match status.output_url() {
                    Some(url) => {
                        info!("Render job {} completed after {}s", job_id, started.elapsed().as_secs());
                        Ok(url)
                    }
                    None => Err(JobError::Result(status.payload.to_string())),
                };
            }

            if status.is_failed() {
                return Err(JobError::Failed(status.payload));
            }

            debug!(
                "Render job {} is '{}', next check in {}ms",
                job_id,
                status.status(),
                interval.as_millis()
            );
            tokio::time::sleep(interval).await;
            interval = self.schedule.next_interval(interval);
        }

        Err(JobError::Timeout(hard_timeout))
    }
}

#[async_trait]
impl VideoRenderer for JobClient {
    async fn render(&self, request: &RenderRequest) -> Result<String, JobError> {
        let job_id = self.submit(request).await?;
        self.wait_for_completion(&job_id, self.schedule.hard_timeout()).await
    }
}
