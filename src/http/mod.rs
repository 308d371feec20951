//! HTTP client module with retry logic and a tagged error type.

mod client;
mod error;
mod retry;

#[cfg(test)]
pub use client::MockFetch;
pub use client::{Fetch, HttpClient, HttpResponse};
pub use error::{HttpError, describe};
pub use retry::{
    MAX_RETRIES, RETRY_DELAY_MS, RetryPolicy, Retryable, is_transient_status, with_retry,
};
