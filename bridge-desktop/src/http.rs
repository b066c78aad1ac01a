//! HTTP Client Implementation using Reqwest

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy},
};
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

const USER_AGENT: &str = concat!("bgg-collection-sync/", env!("CARGO_PKG_VERSION"));
const CONNECTIVITY_PROBE_URL: &str = "https://boardgamegeek.com";

/// Reqwest-based HTTP client implementation
///
/// Connection pooling and TLS come from reqwest. Retryable statuses are
/// retried with backoff; when attempts run out the last response is handed
/// back unchanged so callers can report the status code.
pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    /// Create a new HTTP client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(60))
    }

    /// Create a new HTTP client with custom timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(4)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| {
                BridgeError::NotAvailable(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self { client })
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn convert_method(method: HttpMethod) -> reqwest::Method {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Head => reqwest::Method::HEAD,
        }
    }

    fn build_request(&self, request: &HttpRequest) -> reqwest::RequestBuilder {
        let method = Self::convert_method(request.method);
        let mut req = self.client.request(method, &request.url);

        for (key, value) in &request.headers {
            req = req.header(key, value);
        }

        if let Some(body) = &request.body {
            req = req.body(body.clone());
        }

        if let Some(timeout) = request.timeout {
            req = req.timeout(timeout);
        }

        req
    }

    fn convert_error(error: reqwest::Error) -> BridgeError {
        if error.is_timeout() {
            BridgeError::OperationFailed("Request timed out".to_string())
        } else if error.is_connect() {
            BridgeError::OperationFailed(format!("Connection failed: {}", error))
        } else {
            BridgeError::OperationFailed(error.to_string())
        }
    }

    async fn into_response(response: reqwest::Response) -> Result<HttpResponse> {
        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|s| (k.to_string(), s.to_string())))
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| BridgeError::OperationFailed(e.to_string()))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }

    async fn execute_with_retry_internal(
        &self,
        request: HttpRequest,
        policy: RetryPolicy,
    ) -> Result<HttpResponse> {
        let max_attempts = policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            debug!(
                attempt,
                max_attempts,
                url = %request.url,
                "Executing HTTP request"
            );

            let has_more_attempts = attempt < max_attempts;

            match self.build_request(&request).send().await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    if !(has_more_attempts && policy.should_retry_status(status)) {
                        return Self::into_response(response).await;
                    }
                    warn!(status, attempt, "HTTP request returned retryable status");
                }
                Err(e) => {
                    if !has_more_attempts {
                        return Err(Self::convert_error(e));
                    }
                    warn!(error = %e, attempt, "HTTP request failed");
                }
            }

            let delay = policy.delay_for_attempt(attempt);
            debug!(delay_ms = delay.as_millis() as u64, "Retrying after delay");
            sleep(delay).await;
            attempt += 1;
        }
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.execute_with_retry(request, RetryPolicy::default())
            .await
    }

    async fn execute_with_retry(
        &self,
        request: HttpRequest,
        policy: RetryPolicy,
    ) -> Result<HttpResponse> {
        self.execute_with_retry_internal(request, policy).await
    }

    async fn is_connected(&self) -> bool {
        self.client
            .head(CONNECTIVITY_PROBE_URL)
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .is_ok()
    }
}
