//! Bounded exponential-backoff retry for collaborator calls.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::{error, warn};

/// Backoff settings for [`retry`].
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total invocations allowed, including the first.
    pub max_attempts: u32,
    /// Wait before the second attempt.
    pub initial_delay: Duration,
    /// Multiplier applied to the delay after every failed attempt.
    pub backoff_factor: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            backoff_factor: 2,
        }
    }
}

/// Invoke `operation` until it succeeds or the policy is exhausted.
///
/// The final error is propagated unchanged. No jitter, no circuit breaker;
/// safe to nest.
pub async fn retry<T, E, F, Fut>(label: &str, policy: RetryPolicy, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut delay = policy.initial_delay;
    let mut attempt: u32 = 1;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt >= policy.max_attempts => {
                error!(
                    operation = label,
                    attempts = attempt,
                    error = %err,
                    "Operation failed after all retries"
                );
                return Err(err);
            }
            Err(err) => {
                warn!(
                    operation = label,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Operation failed, retrying"
                );
                tokio::time::sleep(delay).await;
                delay *= policy.backoff_factor;
                attempt += 1;
            }
        }
    }
}
