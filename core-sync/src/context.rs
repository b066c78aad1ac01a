//! Everything a sync run needs from the outside world.

use bridge_traits::collection::CollectionProvider;
use bridge_traits::storage::SettingsStore;
use bridge_traits::time::Clock;
use core_library::repositories::{CollectionRepository, GameRankRepository};
use core_runtime::config::CollectionSyncConfig;
use core_runtime::events::EventBus;
use std::sync::Arc;

use crate::persister::{CollectionPersister, CollectionPersisterBuilder};
use crate::prefs::SyncPreferences;
use crate::status::StatusCatalog;

/// Shared, immutable dependencies of the sync engine.
///
/// One context is built at startup and handed to every run through an `Arc`.
pub struct SyncContext {
    /// Account whose collection is mirrored
    pub username: String,
    pub provider: Arc<dyn CollectionProvider>,
    pub prefs: SyncPreferences,
    pub collection_repository: Arc<dyn CollectionRepository>,
    pub rank_repository: Arc<dyn GameRankRepository>,
    pub catalog: StatusCatalog,
    pub clock: Arc<dyn Clock>,
    pub event_bus: EventBus,
    pub config: CollectionSyncConfig,
}

impl SyncContext {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        username: impl Into<String>,
        provider: Arc<dyn CollectionProvider>,
        settings_store: Arc<dyn SettingsStore>,
        collection_repository: Arc<dyn CollectionRepository>,
        rank_repository: Arc<dyn GameRankRepository>,
        clock: Arc<dyn Clock>,
        event_bus: EventBus,
        config: CollectionSyncConfig,
    ) -> Self {
        Self {
            username: username.into(),
            provider,
            prefs: SyncPreferences::new(settings_store),
            collection_repository,
            rank_repository,
            catalog: StatusCatalog::default(),
            clock,
            event_bus,
            config,
        }
    }

    pub fn with_catalog(mut self, catalog: StatusCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn now_millis(&self) -> i64 {
        self.clock.unix_timestamp_millis()
    }

    pub(crate) fn persister_builder(&self) -> CollectionPersisterBuilder {
        CollectionPersister::builder(
            Arc::clone(&self.collection_repository),
            Arc::clone(&self.rank_repository),
            Arc::clone(&self.clock),
        )
    }
}
