//! HTTP client module with retry policy and error classification.

mod client;
mod retry;

pub use client::HttpClient;
pub use retry::{
    DEFAULT_ATTEMPTS, NonRetryableError, RETRY_DELAY_MS, RetryPolicy, check_retryable,
    classify_error,
};
