//! Storage Abstractions
//!
//! Durable key-value settings. Sync bookkeeping (session and partition
//! timestamps) lives here, so a value once written must be visible to the
//! next process that opens the same store.

use async_trait::async_trait;

use crate::error::Result;

/// Key-value settings storage trait
///
/// Maps to SharedPreferences, UserDefaults or a SQLite table depending on
/// the host. Values are typed; reading a key with the wrong getter is an
/// error rather than a silent coercion.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::SettingsStore;
///
/// async fn last_sync(store: &dyn SettingsStore) -> Result<i64> {
///     Ok(store.get_i64("collection.sync.last_complete").await?.unwrap_or(0))
/// }
/// ```
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Store a string value
    async fn set_string(&self, key: &str, value: &str) -> Result<()>;

    /// Retrieve a string value
    async fn get_string(&self, key: &str) -> Result<Option<String>>;

    /// Store an integer value
    async fn set_i64(&self, key: &str, value: i64) -> Result<()>;

    /// Retrieve an integer value
    async fn get_i64(&self, key: &str) -> Result<Option<i64>>;

    /// Delete a setting; deleting a missing key is not an error
    async fn delete(&self, key: &str) -> Result<()>;

    /// Check if a setting exists
    async fn has_key(&self, key: &str) -> Result<bool>;

    /// List all setting keys
    async fn list_keys(&self) -> Result<Vec<String>>;

    /// Begin a transaction for atomic updates
    ///
    /// Nothing written through the transaction is visible until `commit`.
    async fn begin_transaction(&self) -> Result<Box<dyn SettingsTransaction + Send>>;
}

/// Transaction for atomic settings updates
#[async_trait]
pub trait SettingsTransaction: Send {
    async fn set_string(&mut self, key: &str, value: &str) -> Result<()>;

    async fn set_i64(&mut self, key: &str, value: i64) -> Result<()>;

    async fn delete(&mut self, key: &str) -> Result<()>;

    /// Commit the transaction
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Rollback the transaction
    async fn rollback(self: Box<Self>) -> Result<()>;
}
