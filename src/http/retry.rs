//! Retry policy and HTTP status classification for catalog requests.

use reqwest::StatusCode;
use thiserror::Error;

/// Attempts made per request unless a caller opts into retries.
pub const DEFAULT_ATTEMPTS: usize = 1;

/// Delay between retry attempts in milliseconds.
pub const RETRY_DELAY_MS: u64 = 1000;

/// How many times a request is attempted before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: usize,
    pub delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_ATTEMPTS,
            delay_ms: RETRY_DELAY_MS,
        }
    }
}

impl RetryPolicy {
    /// A policy making `attempts` tries (at least one).
    pub fn with_attempts(attempts: usize) -> Self {
        Self {
            attempts: attempts.max(1),
            ..Default::default()
        }
    }
}

/// Responses that will not succeed on a second attempt.
#[derive(Error, Debug)]
pub enum NonRetryableError {
    #[error("Rate limit exceeded: {0}. Try again later.")]
    RateLimitExceeded(String),
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Access forbidden: {0}")]
    Forbidden(String),
    #[error("Request error: {0}")]
    ClientError(String),
}

/// Classifies an error as retryable or non-retryable.
/// Returns Ok(()) if the error is retryable.
pub fn classify_error(error: &reqwest::Error) -> Result<(), NonRetryableError> {
    if let Some(status) = error.status() {
        let url = error
            .url()
            .map(|u| u.to_string())
            .unwrap_or_else(|| "request".to_string());
        match status {
            StatusCode::UNAUTHORIZED => {
                return Err(NonRetryableError::AuthenticationFailed(url));
            }
            StatusCode::FORBIDDEN => return Err(NonRetryableError::Forbidden(url)),
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(NonRetryableError::RateLimitExceeded(url));
            }
            StatusCode::NOT_FOUND => return Err(NonRetryableError::NotFound(url)),
            s if s.is_client_error() => {
                return Err(NonRetryableError::ClientError(format!(
                    "HTTP {} from {}",
                    s.as_u16(),
                    url
                )));
            }
            // 5xx server errors are retryable
            _ => {}
        }
    }

    // Connection errors, timeouts, etc. are retryable
    Ok(())
}

/// Converts an error from `error_for_status()`, keeping the original error
/// if a retry could help.
pub fn check_retryable(error: reqwest::Error) -> anyhow::Error {
    match classify_error(&error) {
        Ok(()) => anyhow::Error::from(error),
        Err(non_retryable) => anyhow::Error::from(non_retryable),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn status_error(status: usize) -> reqwest::Error {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/")
            .with_status(status)
            .create_async()
            .await;

        let response = reqwest::Client::new()
            .get(server.url())
            .send()
            .await
            .unwrap();
        response.error_for_status().unwrap_err()
    }

    #[test]
    fn test_retry_policy_defaults_to_single_attempt() {
        assert_eq!(RetryPolicy::default().attempts, 1);
        assert_eq!(RetryPolicy::with_attempts(0).attempts, 1);
        assert_eq!(RetryPolicy::with_attempts(3).attempts, 3);
    }

    #[test]
    fn test_non_retryable_error_display() {
        let err = NonRetryableError::RateLimitExceeded("x".to_string());
        assert!(err.to_string().contains("Rate limit"));
        let err = NonRetryableError::ClientError("HTTP 400".to_string());
        assert!(err.to_string().contains("HTTP 400"));
    }

    #[tokio::test]
    async fn test_classify_error_client_statuses() {
        assert!(matches!(
            classify_error(&status_error(401).await),
            Err(NonRetryableError::AuthenticationFailed(_))
        ));
        assert!(matches!(
            classify_error(&status_error(403).await),
            Err(NonRetryableError::Forbidden(_))
        ));
        assert!(matches!(
            classify_error(&status_error(429).await),
            Err(NonRetryableError::RateLimitExceeded(_))
        ));
        assert!(matches!(
            classify_error(&status_error(404).await),
            Err(NonRetryableError::NotFound(_))
        ));
        assert!(matches!(
            classify_error(&status_error(400).await),
            Err(NonRetryableError::ClientError(_))
        ));
    }

    #[tokio::test]
    async fn test_classify_error_server_error_is_retryable() {
        assert!(classify_error(&status_error(500).await).is_ok());
    }

    #[tokio::test]
    async fn test_check_retryable() {
        let err = check_retryable(status_error(404).await);
        assert!(err.downcast_ref::<NonRetryableError>().is_some());

        let err = check_retryable(status_error(503).await);
        assert!(err.downcast_ref::<NonRetryableError>().is_none());
    }
}
