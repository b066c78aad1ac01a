//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (HTTP, settings,
//! clock) into the collection sync core. Desktop apps typically enable the
//! `desktop-shims` feature, which lets [`CoreConfig`] fall back to the
//! reqwest client and SQLite settings store from `bridge-desktop`.
//!
//! ```rust,ignore
//! use core_service::{CoreConfig, CoreService};
//!
//! # async fn example() -> core_service::Result<()> {
//! let config = CoreConfig::builder()
//!     .database_path("/home/alice/.local/share/bgg/collection.db")
//!     .username("alice")
//!     .build()?;
//!
//! let core = CoreService::bootstrap(config).await?;
//! core.set_sync_statuses(&["own", "wishlist", "played"]).await?;
//! let outcome = core.sync_collection().await?;
//! # Ok(())
//! # }
//! ```

pub mod error;

pub use core_runtime::{CoreConfig, CoreConfigBuilder, EventStream};
pub use core_sync::{ClearStats, SkipReason, SyncOutcome, SyncRunId, SyncStats};
pub use error::{CoreError, Result};

use core_library::models::{CollectionItem, GameRank};
use core_library::repositories::{
    CollectionRepository, GameRankRepository, Page, PageRequest, SqliteCollectionRepository,
    SqliteGameRankRepository,
};
use core_library::{create_pool, DatabaseConfig};
use core_runtime::events::EventBus;
use core_sync::{SyncContext, SyncCoordinator};
use provider_bgg::BggCollectionConnector;
use std::sync::Arc;
use tracing::{info, instrument};

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct CoreService {
    coordinator: SyncCoordinator,
    collection_repository: Arc<dyn CollectionRepository>,
    rank_repository: Arc<dyn GameRankRepository>,
    event_bus: EventBus,
}

impl CoreService {
    /// Open the collection database and settings store and wire the sync
    /// engine against the BoardGameGeek API.
    #[instrument(skip(config), fields(database = %config.database_path.display()))]
    pub async fn bootstrap(config: CoreConfig) -> Result<Self> {
        config.validate()?;

        let http_client = config.resolve_http_client()?;
        let settings_store = config.resolve_settings_store().await?;

        if let Some(parent) = config.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    CoreError::InitializationFailed(format!(
                        "Failed to create data directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let pool = create_pool(DatabaseConfig::new(config.database_path.clone())).await?;
        let collection_repository: Arc<dyn CollectionRepository> =
            Arc::new(SqliteCollectionRepository::new(pool.clone()));
        let rank_repository: Arc<dyn GameRankRepository> =
            Arc::new(SqliteGameRankRepository::new(pool));

        let provider = Arc::new(BggCollectionConnector::from_sync_config(
            http_client,
            config.api_base_url.clone(),
            &config.sync,
        ));
        let event_bus = EventBus::new(config.event_buffer_size);

        let ctx = SyncContext::new(
            config.username.clone(),
            provider,
            settings_store,
            Arc::clone(&collection_repository),
            Arc::clone(&rank_repository),
            Arc::clone(&config.clock),
            event_bus.clone(),
            config.sync.clone(),
        );

        info!("Core service ready");
        Ok(Self {
            coordinator: SyncCoordinator::new(Arc::new(ctx)),
            collection_repository,
            rank_repository,
            event_bus,
        })
    }

    /// Run a complete collection sync and wait for it.
    pub async fn sync_collection(&self) -> Result<SyncOutcome> {
        Ok(self.coordinator.run_complete_sync().await?)
    }

    /// Run a modified-since sync and wait for it.
    pub async fn sync_modified_since(&self) -> Result<SyncOutcome> {
        Ok(self.coordinator.run_modified_since_sync().await?)
    }

    pub async fn start_collection_sync(&self) -> Result<SyncRunId> {
        Ok(self.coordinator.start_complete_sync().await?)
    }

    pub async fn start_modified_since_sync(&self) -> Result<SyncRunId> {
        Ok(self.coordinator.start_modified_since_sync().await?)
    }

    pub async fn cancel_sync(&self) -> Option<SyncRunId> {
        self.coordinator.cancel_sync().await
    }

    pub async fn is_sync_active(&self) -> bool {
        self.coordinator.is_sync_active().await
    }

    pub async fn clear_collection_data(&self) -> Result<ClearStats> {
        Ok(self.coordinator.clear_collection_data().await?)
    }

    /// Replace the statuses to sync. An empty list disables syncing.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidInput`] for a status the catalog does not
    /// know.
    pub async fn set_sync_statuses<S: AsRef<str>>(&self, statuses: &[S]) -> Result<()> {
        let ctx = self.coordinator.context();
        if let Some(unknown) = statuses
            .iter()
            .map(|s| s.as_ref().trim())
            .find(|s| !s.is_empty() && !ctx.catalog.is_known(s))
        {
            return Err(CoreError::InvalidInput(format!(
                "Unknown collection status: {}",
                unknown
            )));
        }

        Ok(ctx.prefs.set_configured_statuses(statuses).await?)
    }

    pub async fn sync_statuses(&self) -> Result<Vec<String>> {
        Ok(self.coordinator.context().prefs.configured_statuses().await?)
    }

    pub async fn collection(&self, page: PageRequest) -> Result<Page<CollectionItem>> {
        Ok(self.collection_repository.query(page).await?)
    }

    pub async fn collection_count(&self) -> Result<i64> {
        Ok(self.collection_repository.count().await?)
    }

    pub async fn game_ranks(&self, game_id: i64) -> Result<Vec<GameRank>> {
        Ok(self.rank_repository.find_by_game(game_id).await?)
    }

    pub fn subscribe_events(&self) -> EventStream {
        EventStream::new(self.event_bus.subscribe())
    }
}
