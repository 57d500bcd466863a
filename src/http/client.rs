//! HTTP client shared by the catalog backends.

use anyhow::{Context, Result};
use log::{debug, warn};
use reqwest::Client;

use super::retry::{NonRetryableError, RetryPolicy, check_retryable};

/// HTTP client with an optional retry policy.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    retry: RetryPolicy,
}

impl HttpClient {
    /// Creates a client that makes a single attempt per request.
    pub fn new(client: Client) -> Self {
        Self::with_retry_policy(client, RetryPolicy::default())
    }

    pub fn with_retry_policy(client: Client, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    /// Returns a reference to the underlying reqwest Client.
    pub fn inner(&self) -> &Client {
        &self.client
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Performs a GET request and returns the response body as text.
    #[tracing::instrument(skip(self))]
    pub async fn get_text(&self, url: &str) -> Result<String> {
        debug!("GET text from {}...", url);

        self.with_retry("GET text", || async {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .context("Failed to send request")?;

            let response = response.error_for_status().map_err(check_retryable)?;

            response
                .text()
                .await
                .context("Failed to read response body")
        })
        .await
    }

    /// Performs a POST request with a text body of the given content type and
    /// returns the response body as text.
    #[tracing::instrument(skip(self, body))]
    pub async fn post_text(&self, url: &str, content_type: &str, body: String) -> Result<String> {
        debug!("POST {} to {}...", content_type, url);

        self.with_retry("POST", || async {
            let response = self
                .client
                .post(url)
                .header(reqwest::header::CONTENT_TYPE, content_type)
                .body(body.clone())
                .send()
                .await
                .context("Failed to send request")?;

            let response = response.error_for_status().map_err(check_retryable)?;

            response
                .text()
                .await
                .context("Failed to read response body")
        })
        .await
    }

    /// Executes an async operation according to the retry policy.
    async fn with_retry<F, Fut, T>(&self, operation_name: &str, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let attempts = self.retry.attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    if e.downcast_ref::<NonRetryableError>().is_some() {
                        debug!("{}: non-retryable error: {}", operation_name, e);
                        return Err(e);
                    }

                    if attempt < attempts {
                        warn!(
                            "{}: attempt {}/{} failed ({}), retrying in {}ms...",
                            operation_name, attempt, attempts, e, self.retry.delay_ms
                        );
                        tokio::time::sleep(std::time::Duration::from_millis(self.retry.delay_ms))
                            .await;
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            anyhow::anyhow!("{}: failed after {} attempts", operation_name, attempts)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast_retry(attempts: usize) -> RetryPolicy {
        RetryPolicy {
            attempts,
            delay_ms: 1,
        }
    }

    #[tokio::test]
    async fn test_get_text_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/simple/")
            .with_status(200)
            .with_body("<ul>\n<li>a</li>\n</ul>")
            .create_async()
            .await;

        let client = HttpClient::new(Client::new());
        let body = client
            .get_text(&format!("{}/simple/", server.url()))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(body.lines().count(), 3);
    }

    #[tokio::test]
    async fn test_get_text_not_found() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/missing")
            .with_status(404)
            .create_async()
            .await;

        let client = HttpClient::new(Client::new());
        let result = client
            .get_text(&format!("{}/missing", server.url()))
            .await;

        mock.assert_async().await;
        let err = result.unwrap_err();
        assert!(err.downcast_ref::<NonRetryableError>().is_some());
    }

    #[tokio::test]
    async fn test_post_text_sends_content_type() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/rpc")
            .match_header("content-type", "text/xml")
            .match_body("<methodCall/>")
            .with_status(200)
            .with_body("<methodResponse/>")
            .create_async()
            .await;

        let client = HttpClient::new(Client::new());
        let body = client
            .post_text(
                &format!("{}/rpc", server.url()),
                "text/xml",
                "<methodCall/>".to_string(),
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(body, "<methodResponse/>");
    }

    #[tokio::test]
    async fn test_post_text_retries_server_errors() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/rpc")
            .with_status(502)
            .expect(2)
            .create_async()
            .await;

        let client = HttpClient::with_retry_policy(Client::new(), fast_retry(2));
        let result = client
            .post_text(&format!("{}/rpc", server.url()), "text/xml", String::new())
            .await;

        mock.assert_async().await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_default_policy_does_not_retry() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/flaky")
            .with_status(503)
            .expect(1)
            .create_async()
            .await;

        let client = HttpClient::new(Client::new());
        let result = client.get_text(&format!("{}/flaky", server.url())).await;

        mock.assert_async().await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_with_retry_retries_transient_errors() {
        let client = HttpClient::with_retry_policy(Client::new(), fast_retry(3));
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let result = client
            .with_retry("test", || {
                let count = counter.clone();
                async move {
                    if count.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err::<&str, _>(anyhow::anyhow!("connection reset"))
                    } else {
                        Ok("success after retries")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "success after retries");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_with_retry_stops_on_non_retryable() {
        let client = HttpClient::with_retry_policy(Client::new(), fast_retry(3));
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let result = client
            .with_retry("test", || {
                let count = counter.clone();
                async move {
                    count.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(anyhow::Error::from(NonRetryableError::NotFound(
                        "gone".to_string(),
                    )))
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
