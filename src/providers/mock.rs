/*!
 * Mock rendering provider for testing.
 *
 * The mock replays scripted outcomes:
 * - `MockRenderProvider::completing(url)` - accepts the job and completes on the first poll
 * - `with_create_outcomes` / `with_status_outcomes` - replay an exact sequence
 *
 * When a script runs out, its last entry is repeated, so a single
 * `"processing"` status keeps the job processing forever.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::errors::ProviderError;
use crate::providers::{JobStatus, RenderProvider, RenderRequest};

/// One scripted answer of the mock
#[derive(Debug, Clone)]
pub enum MockOutcome<T> {
    /// Return this value
    Ok(T),
    /// Fail with a connection error
    ConnectionError,
    /// Fail with an HTTP error
    ApiError { status_code: u16, message: String },
    /// Fail with a malformed payload
    Unexpected(String),
}

impl<T: Clone> MockOutcome<T> {
    fn resolve(&self) -> Result<T, ProviderError> {
        match self {
            Self::Ok(value) => Ok(value.clone()),
            Self::ConnectionError => Err(ProviderError::ConnectionError(
                "Simulated connection reset".to_string(),
            )),
            Self::ApiError {
                status_code,
                message,
            } => Err(ProviderError::ApiError {
                status_code: *status_code,
                message: message.clone(),
            }),
            Self::Unexpected(message) => Err(ProviderError::UnexpectedResponse(message.clone())),
        }
    }
}

#[derive(Debug)]
struct Script<T> {
    queue: VecDeque<MockOutcome<T>>,
    last: Option<MockOutcome<T>>,
}

impl<T: Clone> Script<T> {
    fn new(outcomes: Vec<MockOutcome<T>>) -> Self {
        Self {
            queue: outcomes.into(),
            last: None,
        }
    }

    fn next(&mut self) -> Option<MockOutcome<T>> {
        if let Some(outcome) = self.queue.pop_front() {
            self.last = Some(outcome.clone());
        }
        self.last.clone()
    }
}

/// Mock provider replaying scripted create/status outcomes
#[derive(Debug, Clone)]
pub struct MockRenderProvider {
    creates: Arc<Mutex<Script<String>>>,
    statuses: Arc<Mutex<Script<serde_json::Value>>>,
    create_calls: Arc<AtomicUsize>,
    status_calls: Arc<AtomicUsize>,
    last_request: Arc<Mutex<Option<RenderRequest>>>,
}

impl Default for MockRenderProvider {
    fn default() -> Self {
        Self {
            creates: Arc::new(Mutex::new(Script::new(Vec::new()))),
            statuses: Arc::new(Mutex::new(Script::new(Vec::new()))),
            create_calls: Arc::new(AtomicUsize::new(0)),
            status_calls: Arc::new(AtomicUsize::new(0)),
            last_request: Arc::new(Mutex::new(None)),
        }
    }
}

impl MockRenderProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider that accepts every job as `job-1` and reports it completed with `url`
    pub fn completing(url: &str) -> Self {
        Self::new()
            .with_create_outcomes(vec![MockOutcome::Ok("job-1".to_string())])
            .with_status_outcomes(vec![MockOutcome::Ok(
                json!({ "status": "completed", "output_url": url }),
            )])
    }

    /// Script the answers of `create_job`
    pub fn with_create_outcomes(self, outcomes: Vec<MockOutcome<String>>) -> Self {
        *self.creates.lock() = Script::new(outcomes);
        self
    }

    /// Script the answers of `job_status`
    pub fn with_status_outcomes(self, outcomes: Vec<MockOutcome<serde_json::Value>>) -> Self {
        *self.statuses.lock() = Script::new(outcomes);
        self
    }

    /// Script `job_status` from bare status strings
    pub fn with_statuses(self, statuses: &[&str]) -> Self {
        let outcomes = statuses
            .iter()
            .map(|status| MockOutcome::Ok(json!({ "status": status })))
            .collect();
        self.with_status_outcomes(outcomes)
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    /// The most recent submitted request
    pub fn last_request(&self) -> Option<RenderRequest> {
        self.last_request.lock().clone()
    }
}

#[async_trait]
impl RenderProvider for MockRenderProvider {
    async fn create_job(&self, request: &RenderRequest) -> Result<String, ProviderError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock() = Some(request.clone());

        let outcome = self.creates.lock().next();
        match outcome {
            Some(outcome) => outcome.resolve(),
            None => Err(ProviderError::UnexpectedResponse(
                "No scripted create outcome".to_string(),
            )),
        }
    }

    async fn job_status(&self, _job_id: &str) -> Result<JobStatus, ProviderError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);

        let outcome = self.statuses.lock().next();
        match outcome {
            Some(outcome) => outcome.resolve().map(JobStatus::new),
            None => Err(ProviderError::UnexpectedResponse(
                "No scripted status outcome".to_string(),
            )),
        }
    }
}
