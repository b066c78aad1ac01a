//! BoardGameGeek collection connector
//!
//! Implements the `CollectionProvider` trait on top of the host `HttpClient`.

use async_trait::async_trait;
use bridge_traits::collection::{
    CollectionFetch, CollectionProvider, CollectionRequest, RemoteCollection,
};
use bridge_traits::error::Result;
use bridge_traits::http::{HttpClient, HttpRequest, RetryPolicy};
use core_runtime::config::CollectionSyncConfig;
use core_runtime::logging::redact_if_sensitive;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::error::BggError;
use crate::types::{ErrorsXml, ItemsXml};

/// BoardGameGeek XML API v2 collection connector
///
/// Each call issues one `GET {base}/collection?username=..&..` request.
/// The API queues large exports and answers `202 Accepted` until the result
/// is ready, so the retry policy used here retries 202 and 429 (rate limited).
/// A 5xx is returned on the first answer. Any status that is not 200 is
/// reported through [`CollectionFetch::status`], which cancels the run.
///
/// # Example
///
/// ```ignore
/// use provider_bgg::BggCollectionConnector;
/// use bridge_traits::collection::{CollectionProvider, CollectionRequest};
///
/// let connector = BggCollectionConnector::new(http_client, "https://boardgamegeek.com/xmlapi2");
/// let fetch = connector
///     .fetch_collection(&CollectionRequest::new("alice").include_status("own"))
///     .await?;
/// ```
pub struct BggCollectionConnector {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    retry_policy: RetryPolicy,
    request_timeout: Duration,
}

impl BggCollectionConnector {
    pub fn new(http_client: Arc<dyn HttpClient>, base_url: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            retry_policy: RetryPolicy {
                retry_on_accepted: true,
                retry_on_server_error: false,
                ..RetryPolicy::default()
            },
            request_timeout: Duration::from_secs(60),
        }
    }

    /// Connector using the timeouts and retry settings of a sync config.
    pub fn from_sync_config(
        http_client: Arc<dyn HttpClient>,
        base_url: impl Into<String>,
        config: &CollectionSyncConfig,
    ) -> Self {
        Self::new(http_client, base_url)
            .with_retry_policy(RetryPolicy {
                max_attempts: config.max_request_attempts,
                base_delay: config.retry_base_delay,
                max_delay: Duration::from_secs(60),
                use_exponential_backoff: true,
                retry_on_accepted: true,
                retry_on_server_error: false,
            })
            .with_request_timeout(config.request_timeout)
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Full request URL; every value is percent-encoded.
    pub fn build_url(&self, request: &CollectionRequest) -> String {
        let mut url = format!(
            "{}/collection?username={}",
            self.base_url,
            urlencoding::encode(&request.username)
        );

        for (key, value) in request.params() {
            url.push('&');
            url.push_str(&urlencoding::encode(key));
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }

        url
    }

    /// Parse a 200 body.
    ///
    /// An `<errors>` document is an API-level failure even though it comes
    /// with a 200.
    fn parse_body(body: &str) -> std::result::Result<RemoteCollection, BggError> {
        let trimmed = body.trim_start();
        let root = trimmed
            .strip_prefix("<?xml")
            .and_then(|rest| rest.find("?>").map(|idx| rest[idx + 2..].trim_start()))
            .unwrap_or(trimmed);

        if root.starts_with("<errors") || root.starts_with("<error") {
            let message = quick_xml::de::from_str::<ErrorsXml>(body)
                .ok()
                .and_then(|errors| errors.errors.into_iter().next())
                .map(|error| error.message)
                .filter(|message| !message.trim().is_empty())
                .unwrap_or_else(|| "unknown error".to_string());
            return Err(BggError::ApiError(message));
        }

        let items: ItemsXml = quick_xml::de::from_str(body)?;
        Ok(items.into())
    }
}

#[async_trait]
impl CollectionProvider for BggCollectionConnector {
    #[instrument(skip(self, request), fields(username = %redact_if_sensitive("username", &request.username)))]
    async fn fetch_collection(&self, request: &CollectionRequest) -> Result<CollectionFetch> {
        let url = self.build_url(request);
        debug!(params = ?request.params(), "Requesting collection partition");

        let http_request = HttpRequest::get(url)
            .accept("application/xml")
            .timeout(self.request_timeout);

        let response = self
            .http_client
            .execute_with_retry(http_request, self.retry_policy.clone())
            .await?;

        if !response.is_ok() {
            warn!(status = response.status, "Collection request did not succeed");
            return Ok(CollectionFetch::status(response.status));
        }

        let body = response.text()?;
        let collection = Self::parse_body(&body)?;

        info!(
            items = collection.items.len(),
            total_items = collection.total_items,
            "Fetched collection partition"
        );
        Ok(CollectionFetch::ok(collection))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::BridgeError;
    use bridge_traits::http::HttpResponse;
    use bytes::Bytes;
    use mockall::mock;
    use std::collections::HashMap;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
            async fn execute_with_retry(&self, request: HttpRequest, policy: RetryPolicy) -> Result<HttpResponse>;
        }
    }

    const BASE_URL: &str = "https://boardgamegeek.com/xmlapi2";

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: HashMap::new(),
            body: Bytes::from(body.to_string()),
        }
    }

    #[test]
    fn test_build_url_encodes_username_and_params() {
        let connector = BggCollectionConnector::new(Arc::new(MockHttpClient::new()), BASE_URL);
        let request = CollectionRequest::new("Jane Doe")
            .subtype("boardgameaccessory")
            .stats()
            .include_status("own")
            .exclude_status("played")
            .param("modifiedsince", "2024-03-07 09:05:01");

        assert_eq!(
            connector.build_url(&request),
            "https://boardgamegeek.com/xmlapi2/collection?username=Jane%20Doe\
             &subtype=boardgameaccessory&stats=1&own=1&played=0\
             &modifiedsince=2024-03-07%2009%3A05%3A01"
        );
    }

    #[test]
    fn test_trailing_slash_on_base_url() {
        let connector = BggCollectionConnector::new(
            Arc::new(MockHttpClient::new()),
            "https://boardgamegeek.com/xmlapi2/",
        );
        assert_eq!(
            connector.build_url(&CollectionRequest::new("a")),
            "https://boardgamegeek.com/xmlapi2/collection?username=a"
        );
    }

    #[tokio::test]
    async fn test_fetch_parses_items() {
        let mut http = MockHttpClient::new();
        http.expect_execute_with_retry()
            .withf(|request, policy| {
                request.url.ends_with("username=alice&own=1")
                    && request.headers.get("Accept").map(String::as_str) == Some("application/xml")
                    && policy.retry_on_accepted
                    && !policy.should_retry_status(500)
            })
            .times(1)
            .returning(|_, _| {
                Ok(response(
                    200,
                    r#"<items totalitems="1"><item objecttype="thing" objectid="13" subtype="boardgame" collid="7"><name sortindex="1">Catan</name><status own="1" prevowned="0" fortrade="0" want="0" wanttoplay="0" wanttobuy="0" wishlist="0" preordered="0" lastmodified="2024-01-01 00:00:00"/><numplays>3</numplays></item></items>"#,
                ))
            });

        let connector = BggCollectionConnector::new(Arc::new(http), BASE_URL);
        let fetch = connector
            .fetch_collection(&CollectionRequest::new("alice").include_status("own"))
            .await
            .unwrap();

        assert!(fetch.is_success());
        let collection = fetch.collection.unwrap();
        assert_eq!(collection.items.len(), 1);
        assert_eq!(collection.items[0].collection_id, 7);
        assert_eq!(collection.items[0].num_plays, 3);
    }

    #[tokio::test]
    async fn test_non_200_is_reported_as_status() {
        let mut http = MockHttpClient::new();
        http.expect_execute_with_retry()
            .returning(|_, _| Ok(response(202, "<message>Your request has been accepted</message>")));

        let connector = BggCollectionConnector::new(Arc::new(http), BASE_URL);
        let fetch = connector
            .fetch_collection(&CollectionRequest::new("alice"))
            .await
            .unwrap();

        assert_eq!(fetch.status_code, 202);
        assert!(fetch.collection.is_none());
    }

    #[tokio::test]
    async fn test_transport_error_is_err() {
        let mut http = MockHttpClient::new();
        http.expect_execute_with_retry().returning(|_, _| {
            Err(BridgeError::OperationFailed("Request timed out".to_string()))
        });

        let connector = BggCollectionConnector::new(Arc::new(http), BASE_URL);
        let result = connector
            .fetch_collection(&CollectionRequest::new("alice"))
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_errors_document_is_err() {
        let mut http = MockHttpClient::new();
        http.expect_execute_with_retry().returning(|_, _| {
            Ok(response(
                200,
                r#"<?xml version="1.0" encoding="utf-8" standalone="yes"?><errors><error><message>Invalid username specified</message></error></errors>"#,
            ))
        });

        let connector = BggCollectionConnector::new(Arc::new(http), BASE_URL);
        let err = connector
            .fetch_collection(&CollectionRequest::new("nobody"))
            .await
            .err()
            .unwrap();

        assert!(err.to_string().contains("Invalid username specified"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_err() {
        let mut http = MockHttpClient::new();
        http.expect_execute_with_retry()
            .returning(|_, _| Ok(response(200, "<items><item objectid=\"x\"")));

        let connector = BggCollectionConnector::new(Arc::new(http), BASE_URL);
        assert!(connector
            .fetch_collection(&CollectionRequest::new("alice"))
            .await
            .is_err());
    }

    #[test]
    fn test_from_sync_config() {
        let config = CollectionSyncConfig {
            max_request_attempts: 7,
            retry_base_delay: Duration::from_secs(3),
            request_timeout: Duration::from_secs(20),
            ..CollectionSyncConfig::default()
        };

        let connector = BggCollectionConnector::from_sync_config(
            Arc::new(MockHttpClient::new()),
            BASE_URL,
            &config,
        );

        assert_eq!(connector.retry_policy.max_attempts, 7);
        assert_eq!(connector.retry_policy.base_delay, Duration::from_secs(3));
        assert!(connector.retry_policy.retry_on_accepted);
        assert!(connector.retry_policy.should_retry_status(429));
        assert!(!connector.retry_policy.should_retry_status(502));
        assert_eq!(connector.request_timeout, Duration::from_secs(20));
    }
}
