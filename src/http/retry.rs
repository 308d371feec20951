//! Retry policy for transient HTTP failures.

use log::debug;
use reqwest::StatusCode;
use std::future::Future;
use std::time::Duration;

use super::error::HttpError;

/// Default number of re-attempts after the first request.
pub const MAX_RETRIES: u32 = 3;

/// Default backoff unit in milliseconds. The n-th retry waits n times this.
pub const RETRY_DELAY_MS: u64 = 2000;

/// Classification of a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retryable {
    /// The failure might resolve on its own; try again.
    Transient,
    /// Retrying won't help.
    Fatal,
}

/// When and how long to wait before re-issuing a failed request.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Re-attempts after the first request.
    pub max_retries: u32,
    /// Linear backoff unit.
    pub delay_unit: Duration,
    /// Statuses worth retrying.
    pub retry_on: fn(StatusCode) -> bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::linear(MAX_RETRIES, Duration::from_millis(RETRY_DELAY_MS))
    }
}

impl RetryPolicy {
    /// Retries transient statuses, waiting `n * delay_unit` before the n-th retry.
    pub fn linear(max_retries: u32, delay_unit: Duration) -> Self {
        Self {
            max_retries,
            delay_unit,
            retry_on: is_transient_status,
        }
    }

    /// Never retries.
    pub fn none() -> Self {
        Self::linear(0, Duration::ZERO)
    }

    /// Delay before the given retry (1-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        self.delay_unit.saturating_mul(retry)
    }

    pub fn classify(&self, error: &HttpError) -> Retryable {
        match error {
            HttpError::Status { status, .. } if (self.retry_on)(*status) => Retryable::Transient,
            _ => Retryable::Fatal,
        }
    }
}

/// Rate limiting (429) and server errors (5xx and above).
pub fn is_transient_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.as_u16() >= 500
}

/// Runs `operation` until it succeeds, fails fatally, or the policy's retries run out.
/// The last error is returned as-is.
pub async fn with_retry<F, Fut, T>(
    policy: &RetryPolicy,
    operation_name: &str,
    operation: F,
) -> Result<T, HttpError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, HttpError>>,
{
    let mut retry = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                if policy.classify(&e) == Retryable::Fatal {
                    debug!("{}: non-retryable error: {}", operation_name, e);
                    return Err(e);
                }

                if retry >= policy.max_retries {
                    debug!(
                        "{}: giving up after {} retries: {}",
                        operation_name, retry, e
                    );
                    return Err(e);
                }

                retry += 1;
                let delay = policy.backoff(retry);
                debug!(
                    "{}: attempt {}/{} failed ({}), retrying in {}ms...",
                    operation_name,
                    retry,
                    policy.max_retries + 1,
                    e,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
