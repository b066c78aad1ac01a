//! HTTP Client Abstraction
//!
//! Provides async HTTP operations with a configurable retry policy. The
//! collection API answers some requests with `202 Accepted` while it builds
//! the export, so the policy can opt in to treating that status as "try
//! again later".

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::time::Duration;

use crate::error::{BridgeError, Result};

/// HTTP method types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Head,
}

/// HTTP request builder
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Option<Bytes>,
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HashMap::new(),
            body: None,
            timeout: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn accept(self, media_type: impl Into<String>) -> Self {
        self.header("Accept", media_type)
    }

    pub fn body(mut self, body: Bytes) -> Self {
        self.body = Some(body);
        self
    }

    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }
}

/// HTTP response
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Bytes,
}

impl HttpResponse {
    /// Get response body as UTF-8 string
    pub fn text(&self) -> Result<String> {
        String::from_utf8(self.body.to_vec())
            .map_err(|e| BridgeError::OperationFailed(format!("Invalid UTF-8: {}", e)))
    }

    /// Exactly 200; the only status that carries a usable collection body
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// Check if response status is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Check if response status indicates a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    /// Check if response status indicates a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }
}

/// Retry policy configuration
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,
    /// Base delay between retries
    pub base_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Whether to use exponential backoff
    pub use_exponential_backoff: bool,
    /// Retry `202 Accepted` (request queued server side)
    pub retry_on_accepted: bool,
    /// Retry 5xx responses
    pub retry_on_server_error: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
            use_exponential_backoff: true,
            retry_on_accepted: false,
            retry_on_server_error: true,
        }
    }
}

impl RetryPolicy {
    /// Policy with no retries at all.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Whether a response with this status should be attempted again.
    pub fn should_retry_status(&self, status: u16) -> bool {
        status == 429
            || (self.retry_on_server_error && (500..600).contains(&status))
            || (self.retry_on_accepted && status == 202)
    }

    /// Delay before the retry that follows `attempt` (1-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = if self.use_exponential_backoff {
            let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
            self.base_delay.saturating_mul(factor)
        } else {
            self.base_delay
        };
        delay.min(self.max_delay)
    }
}

/// Async HTTP client trait
///
/// Implementations should handle TLS, connection pooling and timeouts.
/// `execute_with_retry` returns the last response once attempts run out
/// instead of turning a retryable status into an error, so callers still see
/// the status code.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::http::{HttpClient, HttpRequest};
///
/// async fn fetch(client: &dyn HttpClient) -> Result<String> {
///     let response = client.execute(HttpRequest::get("https://example.com/xmlapi2/thing?id=1")).await?;
///     response.text()
/// }
/// ```
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Execute an HTTP request
    ///
    /// # Errors
    ///
    /// Returns error if the connection fails, TLS validation fails or the
    /// request times out. HTTP error statuses are not errors.
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;

    /// Execute an HTTP request with custom retry policy
    async fn execute_with_retry(
        &self,
        request: HttpRequest,
        policy: RetryPolicy,
    ) -> Result<HttpResponse> {
        let _ = policy;
        self.execute(request).await
    }

    /// Check network connectivity
    async fn is_connected(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_request_builder() {
        let request = HttpRequest::get("https://example.com")
            .header("User-Agent", "test")
            .accept("application/xml")
            .timeout(Duration::from_secs(30));

        assert_eq!(request.method, HttpMethod::Get);
        assert_eq!(request.url, "https://example.com");
        assert_eq!(request.headers.get("User-Agent"), Some(&"test".to_string()));
        assert_eq!(
            request.headers.get("Accept"),
            Some(&"application/xml".to_string())
        );
        assert_eq!(request.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_http_response_status_checks() {
        let response = HttpResponse {
            status: 202,
            headers: HashMap::new(),
            body: Bytes::new(),
        };

        assert!(response.is_success());
        assert!(!response.is_ok());
        assert!(!response.is_client_error());
        assert!(!response.is_server_error());
    }

    #[test]
    fn test_retry_policy_statuses() {
        let policy = RetryPolicy::default();
        assert!(policy.should_retry_status(500));
        assert!(policy.should_retry_status(429));
        assert!(!policy.should_retry_status(202));
        assert!(!policy.should_retry_status(404));

        let queued = RetryPolicy {
            retry_on_accepted: true,
            ..RetryPolicy::default()
        };
        assert!(queued.should_retry_status(202));

        let queued_only = RetryPolicy {
            retry_on_accepted: true,
            retry_on_server_error: false,
            ..RetryPolicy::default()
        };
        assert!(queued_only.should_retry_status(202));
        assert!(queued_only.should_retry_status(429));
        assert!(!queued_only.should_retry_status(500));
        assert!(!queued_only.should_retry_status(503));
    }

    #[test]
    fn test_retry_policy_backoff_is_capped() {
        let policy = RetryPolicy {
            max_attempts: 10,
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(10),
            use_exponential_backoff: true,
            retry_on_accepted: true,
            retry_on_server_error: true,
        };

        assert_eq!(policy.delay_for_attempt(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_secs(8));
        assert_eq!(policy.delay_for_attempt(4), Duration::from_secs(10));
    }
}
