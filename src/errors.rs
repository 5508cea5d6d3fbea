/*!
 * Error types for the promobot application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur when talking to the rendering API
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error returned by the API itself
    #[error("Render API error {status_code}: {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Response body excerpt (at most 300 characters)
        message: String,
    },

    /// The API answered successfully but the payload was not what we expected
    #[error("Unexpected render API response: {0}")]
    UnexpectedResponse(String),
}

impl ProviderError {
    /// Whether the failure is worth retrying even under a strict retry policy.
    ///
    /// Connection failures, rate limiting and server-side errors are transient;
    /// client errors and malformed payloads are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ConnectionError(_) => true,
            Self::ApiError { status_code, .. } => *status_code == 429 || *status_code >= 500,
            Self::UnexpectedResponse(_) => false,
        }
    }
}

/// Errors that end a video job run
#[derive(Error, Debug)]
pub enum JobError {
    /// Submitting the job or checking its status failed
    #[error("{0}")]
    Submission(#[from] ProviderError),

    /// The job completed but the payload carried no output URL
    #[error("Completed job has no output URL: {0}")]
    Result(String),

    /// The service reported a terminal failure status
    #[error("Job failed: {0}")]
    Failed(serde_json::Value),

    /// No terminal status was observed before the hard timeout
    #[error("Video generation timed out after {}s", .0.as_secs())]
    Timeout(Duration),
}

/// Errors produced while parsing a campaign parameter line
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Fewer than the three required fields were supplied
    #[error("Expected at least 3 fields, found {0}")]
    TooFewFields(usize),

    /// A required field was empty after trimming
    #[error("Field '{0}' must not be empty")]
    EmptyField(&'static str),
}

/// Errors that can occur when talking to the chat transport
#[derive(Error, Debug)]
pub enum TransportError {
    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The Bot API rejected the call
    #[error("Telegram API error {code}: {description}")]
    ApiError {
        /// Error code reported by the API (or the HTTP status)
        code: i64,
        /// Human readable description
        description: String,
    },

    /// Failed to parse an API response
    #[error("Failed to parse Telegram response: {0}")]
    ParseError(String),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Invalid or incomplete configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from the chat transport
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Error from a video job
    #[error("Job error: {0}")]
    Job(#[from] JobError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

/// Truncate `text` to at most `max_chars` characters without splitting a code point
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
