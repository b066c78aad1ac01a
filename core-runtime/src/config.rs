//! # Core Configuration Module
//!
//! Builder-based configuration for the collection sync core.
//!
//! ## Overview
//!
//! [`CoreConfig`] carries the account being synced, where the local
//! collection database lives, the host bridges and the sync timings. The
//! builder fails fast with actionable messages when something required is
//! missing.
//!
//! ## Required
//!
//! - `username` - the remote account whose collection is mirrored
//! - `database_path` - local SQLite file for the collection
//!
//! ## Optional (with platform defaults)
//!
//! - `HttpClient` - desktop default: reqwest
//! - `SettingsStore` - desktop default: `settings.db` next to the database
//! - `Clock` - defaults to the system clock
//!
//! The desktop defaults are only compiled in with the `desktop-shims`
//! feature; without it the host must inject both bridges.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::time::Duration;
//!
//! let config = CoreConfig::builder()
//!     .username("alice")
//!     .database_path("/data/collection.db")
//!     .partition_pause(Duration::from_secs(5))
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use bridge_traits::{Clock, HttpClient, SettingsStore, SystemClock};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://boardgamegeek.com/xmlapi2";

const MAX_PARTITION_PAUSE: Duration = Duration::from_secs(300);

/// Timings for collection sync runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSyncConfig {
    /// Wait between two partition requests
    pub partition_pause: Duration,
    /// A complete sync newer than this is not repeated
    pub full_sync_interval: Duration,
    /// A modified-since sync is skipped while the last complete sync is
    /// younger than this
    pub partial_sync_cooldown: Duration,
    /// Per-request timeout handed to the HTTP client
    pub request_timeout: Duration,
    /// Attempts per partition request while the server answers 202/429/5xx
    pub max_request_attempts: u32,
    /// First retry delay; doubles per attempt
    pub retry_base_delay: Duration,
}

impl Default for CollectionSyncConfig {
    fn default() -> Self {
        Self {
            partition_pause: Duration::from_secs(5),
            full_sync_interval: Duration::from_secs(7 * 24 * 60 * 60),
            partial_sync_cooldown: Duration::from_secs(3 * 60 * 60),
            request_timeout: Duration::from_secs(60),
            max_request_attempts: 5,
            retry_base_delay: Duration::from_secs(2),
        }
    }
}

impl CollectionSyncConfig {
    pub fn validate(&self) -> Result<()> {
        if self.partition_pause > MAX_PARTITION_PAUSE {
            return Err(Error::Config(format!(
                "Partition pause of {:?} exceeds the maximum of {:?}",
                self.partition_pause, MAX_PARTITION_PAUSE
            )));
        }

        if self.full_sync_interval.is_zero() {
            return Err(Error::Config(
                "Full sync interval must be greater than zero".to_string(),
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(Error::Config(
                "Request timeout must be greater than zero".to_string(),
            ));
        }

        if !(1..=10).contains(&self.max_request_attempts) {
            return Err(Error::Config(format!(
                "Request attempts must be between 1 and 10, got {}",
                self.max_request_attempts
            )));
        }

        Ok(())
    }
}

/// Core configuration.
#[derive(Clone)]
pub struct CoreConfig {
    pub database_path: PathBuf,
    pub username: String,
    pub api_base_url: String,
    pub http_client: Option<Arc<dyn HttpClient>>,
    pub settings_store: Option<Arc<dyn SettingsStore>>,
    pub clock: Arc<dyn Clock>,
    pub sync: CollectionSyncConfig,
    pub event_buffer_size: usize,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("database_path", &self.database_path)
            .field(
                "username",
                &crate::logging::redact_if_sensitive("username", &self.username),
            )
            .field("api_base_url", &self.api_base_url)
            .field("http_client", &self.http_client.is_some())
            .field("settings_store", &self.settings_store.is_some())
            .field("sync", &self.sync)
            .field("event_buffer_size", &self.event_buffer_size)
            .finish()
    }
}

impl CoreConfig {
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration.
    ///
    /// Checks the account name, the database path, the API base URL and the
    /// sync timings.
    pub fn validate(&self) -> Result<()> {
        if self.username.trim().is_empty() {
            return Err(Error::Config("Username cannot be empty".to_string()));
        }

        if self.username.chars().any(char::is_control) {
            return Err(Error::Config(
                "Username cannot contain control characters".to_string(),
            ));
        }

        if self.database_path.as_os_str().is_empty() {
            return Err(Error::Config("Database path cannot be empty".to_string()));
        }

        if !(self.api_base_url.starts_with("https://") || self.api_base_url.starts_with("http://"))
        {
            return Err(Error::Config(format!(
                "API base URL must be http(s): {}",
                self.api_base_url
            )));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than zero".to_string(),
            ));
        }

        self.sync.validate()
    }

    /// The injected HTTP client, or the desktop default.
    pub fn resolve_http_client(&self) -> Result<Arc<dyn HttpClient>> {
        match &self.http_client {
            Some(client) => Ok(client.clone()),
            None => provide_default_http_client(&self.sync),
        }
    }

    /// The injected settings store, or the desktop default opened next to
    /// the collection database.
    pub async fn resolve_settings_store(&self) -> Result<Arc<dyn SettingsStore>> {
        match &self.settings_store {
            Some(store) => Ok(store.clone()),
            None => provide_default_settings_store(&self.database_path).await,
        }
    }
}

/// Where the desktop settings store lives for a given database path.
pub fn default_settings_path(database_path: &Path) -> PathBuf {
    database_path
        .parent()
        .map(|parent| parent.join("settings.db"))
        .unwrap_or_else(|| PathBuf::from("settings.db"))
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client(sync: &CollectionSyncConfig) -> Result<Arc<dyn HttpClient>> {
    use bridge_desktop::ReqwestHttpClient;

    let client = ReqwestHttpClient::with_timeout(sync.request_timeout).map_err(|e| {
        Error::Internal(format!("Failed to initialize default HttpClient: {}", e))
    })?;
    Ok(Arc::new(client))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client(_sync: &CollectionSyncConfig) -> Result<Arc<dyn HttpClient>> {
    Err(Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "An HttpClient implementation is required to reach the collection API. \
                  Desktop: enable the 'desktop-shims' feature to use ReqwestHttpClient. \
                  Mobile: inject the platform HTTP stack."
            .to_string(),
    })
}

#[cfg(feature = "desktop-shims")]
async fn provide_default_settings_store(database_path: &Path) -> Result<Arc<dyn SettingsStore>> {
    use bridge_desktop::SqliteSettingsStore;

    let store = SqliteSettingsStore::new(default_settings_path(database_path))
        .await
        .map_err(|e| {
            Error::Internal(format!("Failed to initialize default SettingsStore: {}", e))
        })?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "desktop-shims"))]
async fn provide_default_settings_store(_database_path: &Path) -> Result<Arc<dyn SettingsStore>> {
    Err(Error::CapabilityMissing {
        capability: "SettingsStore".to_string(),
        message: "A SettingsStore implementation is required for sync timestamps. \
                  Desktop: enable the 'desktop-shims' feature to use SqliteSettingsStore. \
                  Mobile: inject SharedPreferences/UserDefaults backed storage."
            .to_string(),
    })
}

/// Builder for [`CoreConfig`].
#[derive(Default)]
pub struct CoreConfigBuilder {
    database_path: Option<PathBuf>,
    username: Option<String>,
    api_base_url: Option<String>,
    http_client: Option<Arc<dyn HttpClient>>,
    settings_store: Option<Arc<dyn SettingsStore>>,
    clock: Option<Arc<dyn Clock>>,
    sync: CollectionSyncConfig,
    event_buffer_size: Option<usize>,
}

impl CoreConfigBuilder {
    pub fn database_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.database_path = Some(path.into());
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Override the API root (tests, mirrors). Trailing slashes are dropped.
    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = Some(url.into().trim_end_matches('/').to_string());
        self
    }

    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn settings_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.settings_store = Some(store);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn sync_config(mut self, sync: CollectionSyncConfig) -> Self {
        self.sync = sync;
        self
    }

    pub fn partition_pause(mut self, pause: Duration) -> Self {
        self.sync.partition_pause = pause;
        self
    }

    pub fn full_sync_interval(mut self, interval: Duration) -> Self {
        self.sync.full_sync_interval = interval;
        self
    }

    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    pub fn build(self) -> Result<CoreConfig> {
        let username = self.username.ok_or_else(|| {
            Error::Config("Username is required. Use .username() to set it.".to_string())
        })?;

        let database_path = self.database_path.ok_or_else(|| {
            Error::Config("Database path is required. Use .database_path() to set it.".to_string())
        })?;

        let config = CoreConfig {
            database_path,
            username,
            api_base_url: self
                .api_base_url
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            http_client: self.http_client,
            settings_store: self.settings_store,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            sync: self.sync,
            event_buffer_size: self
                .event_buffer_size
                .unwrap_or(crate::events::DEFAULT_EVENT_BUFFER_SIZE),
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::http::{HttpRequest, HttpResponse};
    use bridge_traits::ManualClock;

    struct StubHttpClient;

    #[async_trait]
    impl HttpClient for StubHttpClient {
        async fn execute(&self, _request: HttpRequest) -> BridgeResult<HttpResponse> {
            Ok(HttpResponse {
                status: 200,
                headers: Default::default(),
                body: Default::default(),
            })
        }
    }

    #[test]
    fn test_build_with_defaults() {
        let config = CoreConfig::builder()
            .username("alice")
            .database_path("/tmp/collection.db")
            .build()
            .unwrap();

        assert_eq!(config.username, "alice");
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.sync, CollectionSyncConfig::default());
        assert_eq!(config.sync.partition_pause, Duration::from_secs(5));
        assert_eq!(
            config.sync.full_sync_interval,
            Duration::from_secs(604_800)
        );
        assert_eq!(
            config.event_buffer_size,
            crate::events::DEFAULT_EVENT_BUFFER_SIZE
        );
    }

    #[test]
    fn test_missing_username_is_actionable() {
        let err = CoreConfig::builder()
            .database_path("/tmp/collection.db")
            .build()
            .unwrap_err();

        assert!(err.to_string().contains(".username()"));
    }

    #[test]
    fn test_blank_username_rejected() {
        let result = CoreConfig::builder()
            .username("   ")
            .database_path("/tmp/collection.db")
            .build();

        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_api_base_url_validation_and_trailing_slash() {
        let config = CoreConfig::builder()
            .username("alice")
            .database_path("/tmp/collection.db")
            .api_base_url("http://localhost:8080/xmlapi2/")
            .build()
            .unwrap();
        assert_eq!(config.api_base_url, "http://localhost:8080/xmlapi2");

        let result = CoreConfig::builder()
            .username("alice")
            .database_path("/tmp/collection.db")
            .api_base_url("ftp://example.com")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_sync_timing_validation() {
        let too_long = CoreConfig::builder()
            .username("alice")
            .database_path("/tmp/collection.db")
            .partition_pause(Duration::from_secs(600))
            .build();
        assert!(too_long.is_err());

        let zero_interval = CoreConfig::builder()
            .username("alice")
            .database_path("/tmp/collection.db")
            .full_sync_interval(Duration::ZERO)
            .build();
        assert!(zero_interval.is_err());

        let bad_attempts = CollectionSyncConfig {
            max_request_attempts: 0,
            ..CollectionSyncConfig::default()
        };
        assert!(bad_attempts.validate().is_err());
    }

    #[test]
    fn test_injected_bridges_are_used() {
        let clock = Arc::new(ManualClock::new(1_000));
        let config = CoreConfig::builder()
            .username("alice")
            .database_path("/tmp/collection.db")
            .http_client(Arc::new(StubHttpClient))
            .clock(clock)
            .build()
            .unwrap();

        assert!(config.resolve_http_client().is_ok());
        assert_eq!(config.clock.unix_timestamp_millis(), 1_000);
    }

    #[test]
    fn test_debug_redacts_username() {
        let config = CoreConfig::builder()
            .username("alice")
            .database_path("/tmp/collection.db")
            .build()
            .unwrap();

        let debug = format!("{:?}", config);
        assert!(debug.contains("a***"));
        assert!(!debug.contains("alice"));
    }

    #[test]
    fn test_default_settings_path() {
        assert_eq!(
            default_settings_path(Path::new("/data/bgg/collection.db")),
            PathBuf::from("/data/bgg/settings.db")
        );
    }

    #[cfg(feature = "desktop-shims")]
    #[core_async::test]
    async fn test_desktop_default_settings_store_is_durable() {
        let dir = tempfile::tempdir().unwrap();
        let config = CoreConfig::builder()
            .username("alice")
            .database_path(dir.path().join("collection.db"))
            .build()
            .unwrap();

        let store = config.resolve_settings_store().await.unwrap();
        store.set_i64("collection.sync.session", 77).await.unwrap();

        assert!(dir.path().join("settings.db").exists());
        assert_eq!(
            store.get_i64("collection.sync.session").await.unwrap(),
            Some(77)
        );
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[core_async::test]
    async fn test_missing_settings_store_without_shims() {
        let config = CoreConfig::builder()
            .username("alice")
            .database_path("/tmp/collection.db")
            .build()
            .unwrap();

        let err = config.resolve_settings_store().await.err().unwrap();
        assert!(matches!(err, Error::CapabilityMissing { .. }));
    }
}
