/*!
 * Bounded retry with exponential backoff.
 *
 * A `RetryPolicy` is plain data (attempt ceiling, first delay, growth factor,
 * delay cap) so it can live in the configuration file. `retry_async` applies a
 * policy to any fallible async operation.
 */

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Retry policy applied around a single network call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one
    pub max_attempts: u32,

    /// Delay after the first failed attempt in milliseconds
    pub initial_delay_ms: u64,

    /// Factor applied to the delay after each further failure
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,

    /// Upper bound for a single delay in milliseconds
    pub max_delay_ms: u64,

    /// Retry client errors (4xx, malformed payloads) as well as transient ones
    #[serde(default = "default_true")]
    pub retry_client_errors: bool,
}

fn default_multiplier() -> f64 {
    2.0
}

fn default_true() -> bool {
    true
}

impl RetryPolicy {
    /// Policy used for job submission: 3 attempts, 1s doubling, capped at 6s
    pub fn submission() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 1_000,
            multiplier: 2.0,
            max_delay_ms: 6_000,
            retry_client_errors: true,
        }
    }

    /// Policy used for a single status check: 5 attempts, 1s doubling, capped at 10s
    pub fn status_check() -> Self {
        Self {
            max_attempts: 5,
            initial_delay_ms: 1_000,
            multiplier: 2.0,
            max_delay_ms: 10_000,
            retry_client_errors: true,
        }
    }

    /// Delay to wait after the given failed attempt (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(63) as i32;
        let raw = self.initial_delay_ms as f64 * self.multiplier.max(1.0).powi(exponent);
        let capped = raw.min(self.max_delay_ms as f64).max(0.0);
        Duration::from_millis(capped as u64)
    }

    /// Attempt ceiling, never below one
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// Run `operation` until it succeeds, the policy is exhausted, or `is_retryable`
/// rejects the error.
///
/// The last error is returned unchanged once no further attempt is allowed.
pub async fn retry_async<T, E, F, Fut, R>(
    policy: &RetryPolicy,
    label: &str,
    is_retryable: R,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: Fn(&E) -> bool,
    E: Display,
{
    let attempts = policy.attempts();
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!("{} succeeded on attempt {}/{}", label, attempt, attempts);
                }
                return Ok(value);
            }
            Err(error) => {
                if attempt >= attempts || !is_retryable(&error) {
                    return Err(error);
                }

                let delay = policy.delay_for(attempt);
                warn!(
                    "{} failed (attempt {}/{}): {}. Retrying in {}ms",
                    label,
                    attempt,
                    attempts,
                    error,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
