//! # Sync Preferences
//!
//! Durable sync bookkeeping on top of the host [`SettingsStore`]. Every value
//! is a millisecond timestamp; a missing key reads as 0.

use bridge_traits::storage::SettingsStore;
use std::sync::Arc;
use tracing::debug;

use crate::error::Result;
use crate::status::{normalize_status, parse_status_list, CollectionSubtype};

const KEY_PREFIX: &str = "collection.sync.";
pub const KEY_SESSION: &str = "collection.sync.session";
pub const KEY_LAST_COMPLETE: &str = "collection.sync.last_complete";
pub const KEY_LAST_PARTIAL: &str = "collection.sync.last_partial";
const PARTITION_PREFIX: &str = "collection.sync.partition.";
/// User setting, comma separated; not a timestamp.
pub const KEY_STATUSES: &str = "collection.sync.statuses";

#[derive(Clone)]
pub struct SyncPreferences {
    store: Arc<dyn SettingsStore>,
}

impl SyncPreferences {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self { store }
    }

    pub fn partition_key(subtype: CollectionSubtype, status: &str) -> String {
        format!("{}{}.{}", PARTITION_PREFIX, subtype.key_segment(), status)
    }

    async fn timestamp(&self, key: &str) -> Result<i64> {
        Ok(self.store.get_i64(key).await?.unwrap_or(0))
    }

    /// Open session timestamp, 0 when no complete sync is in progress.
    pub async fn session(&self) -> Result<i64> {
        self.timestamp(KEY_SESSION).await
    }

    pub async fn set_session(&self, timestamp: i64) -> Result<()> {
        debug!(timestamp, "Opening collection sync session");
        Ok(self.store.set_i64(KEY_SESSION, timestamp).await?)
    }

    pub async fn last_complete(&self) -> Result<i64> {
        self.timestamp(KEY_LAST_COMPLETE).await
    }

    pub async fn last_partial(&self) -> Result<i64> {
        self.timestamp(KEY_LAST_PARTIAL).await
    }

    pub async fn set_last_partial(&self, timestamp: i64) -> Result<()> {
        Ok(self.store.set_i64(KEY_LAST_PARTIAL, timestamp).await?)
    }

    pub async fn partition_timestamp(&self, subtype: CollectionSubtype, status: &str) -> Result<i64> {
        self.timestamp(&Self::partition_key(subtype, status)).await
    }

    pub async fn set_partition_timestamp(
        &self,
        subtype: CollectionSubtype,
        status: &str,
        timestamp: i64,
    ) -> Result<()> {
        Ok(self
            .store
            .set_i64(&Self::partition_key(subtype, status), timestamp)
            .await?)
    }

    /// Close a finished complete sync: both "last" timestamps become
    /// `session` and the session is cleared, all in one transaction.
    pub async fn finalize_complete(&self, session: i64) -> Result<()> {
        let mut tx = self.store.begin_transaction().await?;
        tx.set_i64(KEY_LAST_COMPLETE, session).await?;
        tx.set_i64(KEY_LAST_PARTIAL, session).await?;
        tx.set_i64(KEY_SESSION, 0).await?;
        tx.commit().await?;

        debug!(session, "Closed collection sync session");
        Ok(())
    }

    /// Statuses the user chose to sync, in the order they were stored.
    pub async fn configured_statuses(&self) -> Result<Vec<String>> {
        Ok(self
            .store
            .get_string(KEY_STATUSES)
            .await?
            .map(|value| parse_status_list(&value))
            .unwrap_or_default())
    }

    /// Store statuses lowercased, without blanks or repeats, in the given order.
    pub async fn set_configured_statuses<S: AsRef<str>>(&self, statuses: &[S]) -> Result<()> {
        let mut normalized: Vec<String> = Vec::with_capacity(statuses.len());
        for status in statuses.iter().filter_map(|s| normalize_status(s.as_ref())) {
            if !normalized.contains(&status) {
                normalized.push(status);
            }
        }
        let value = normalized.join(",");
        Ok(self.store.set_string(KEY_STATUSES, &value).await?)
    }

    /// Remove every sync timestamp; the statuses setting survives.
    ///
    /// # Returns
    /// Number of keys removed
    pub async fn clear_collection_timestamps(&self) -> Result<usize> {
        let keys: Vec<String> = self
            .store
            .list_keys()
            .await?
            .into_iter()
            .filter(|key| key.starts_with(KEY_PREFIX) && key != KEY_STATUSES)
            .collect();

        let mut tx = self.store.begin_transaction().await?;
        for key in &keys {
            tx.delete(key).await?;
        }
        tx.commit().await?;

        debug!(removed = keys.len(), "Cleared collection sync timestamps");
        Ok(keys.len())
    }
}
