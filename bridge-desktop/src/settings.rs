//! Settings Storage using SQLite

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::{SettingsStore, SettingsTransaction},
};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::{Executor, Row, Sqlite};
use std::path::PathBuf;
use tracing::{debug, error};

const CREATE_TABLE_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS settings (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL,
        value_type TEXT NOT NULL,
        updated_at INTEGER NOT NULL
    )
"#;

const UPSERT_SQL: &str = r#"
    INSERT INTO settings (key, value, value_type, updated_at)
    VALUES (?, ?, ?, ?)
    ON CONFLICT(key) DO UPDATE SET
        value = excluded.value,
        value_type = excluded.value_type,
        updated_at = excluded.updated_at
"#;

const TYPE_STRING: &str = "string";
const TYPE_I64: &str = "i64";

/// SQLite-backed settings store implementation
///
/// Every write is committed with `synchronous = FULL`, so a timestamp
/// written right before the process dies is still there on the next launch.
pub struct SqliteSettingsStore {
    pool: SqlitePool,
}

impl SqliteSettingsStore {
    /// Open (or create) the settings database at `db_path`
    pub async fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(BridgeError::Io)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Full);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Failed to connect to DB: {}", e)))?;

        Self::init(pool, &format!("{}", db_path.display())).await
    }

    /// Create an in-memory settings store (for testing)
    ///
    /// Pinned to a single connection that never expires; a second connection
    /// would open a different, empty database.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Failed to connect to DB: {}", e)))?;

        Self::init(pool, ":memory:").await
    }

    async fn init(pool: SqlitePool, location: &str) -> Result<Self> {
        sqlx::query(CREATE_TABLE_SQL)
            .execute(&pool)
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Failed to create table: {}", e)))?;

        debug!(location, "Initialized settings store");
        Ok(Self { pool })
    }

    /// Close the pool and flush the WAL.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    fn now() -> i64 {
        chrono::Utc::now().timestamp()
    }

    async fn upsert<'e, E>(executor: E, key: &str, value: &str, value_type: &str) -> Result<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(UPSERT_SQL)
            .bind(key)
            .bind(value)
            .bind(value_type)
            .bind(Self::now())
            .execute(executor)
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Failed to set setting: {}", e)))?;

        debug!(key, value_type, "Stored setting");
        Ok(())
    }

    async fn remove<'e, E>(executor: E, key: &str) -> Result<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query("DELETE FROM settings WHERE key = ?")
            .bind(key)
            .execute(executor)
            .await
            .map_err(|e| {
                BridgeError::DatabaseError(format!("Failed to delete setting: {}", e))
            })?;

        debug!(key, "Deleted setting");
        Ok(())
    }

    /// Get a value and verify its type
    async fn get_value(&self, key: &str, expected_type: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value, value_type FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Failed to get setting: {}", e)))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let value: String = row.get(0);
        let value_type: String = row.get(1);

        if value_type != expected_type {
            error!(key, expected = expected_type, actual = %value_type, "Type mismatch");
            return Err(BridgeError::TypeMismatch {
                key: key.to_string(),
                expected: expected_type.to_string(),
                found: value_type,
            });
        }

        Ok(Some(value))
    }
}

#[async_trait]
impl SettingsStore for SqliteSettingsStore {
    async fn set_string(&self, key: &str, value: &str) -> Result<()> {
        Self::upsert(&self.pool, key, value, TYPE_STRING).await
    }

    async fn get_string(&self, key: &str) -> Result<Option<String>> {
        self.get_value(key, TYPE_STRING).await
    }

    async fn set_i64(&self, key: &str, value: i64) -> Result<()> {
        Self::upsert(&self.pool, key, &value.to_string(), TYPE_I64).await
    }

    async fn get_i64(&self, key: &str) -> Result<Option<i64>> {
        match self.get_value(key, TYPE_I64).await? {
            Some(s) => Ok(Some(s.parse().map_err(|e| {
                BridgeError::OperationFailed(format!("Parse error for '{}': {}", key, e))
            })?)),
            None => Ok(None),
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        Self::remove(&self.pool, key).await
    }

    async fn has_key(&self, key: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Failed to check key: {}", e)))?;

        Ok(row.is_some())
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT key FROM settings ORDER BY key")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Failed to list keys: {}", e)))?;

        Ok(rows.into_iter().map(|row| row.get(0)).collect())
    }

    async fn begin_transaction(&self) -> Result<Box<dyn SettingsTransaction + Send>> {
        let tx = self.pool.begin().await.map_err(|e| {
            BridgeError::DatabaseError(format!("Failed to begin transaction: {}", e))
        })?;

        Ok(Box::new(SqliteSettingsTransaction { tx: Some(tx) }))
    }
}

struct SqliteSettingsTransaction {
    tx: Option<sqlx::Transaction<'static, Sqlite>>,
}

impl SqliteSettingsTransaction {
    fn active(&mut self) -> Result<&mut sqlx::Transaction<'static, Sqlite>> {
        self.tx.as_mut().ok_or_else(|| {
            BridgeError::OperationFailed("Transaction already finished".to_string())
        })
    }
}

#[async_trait]
impl SettingsTransaction for SqliteSettingsTransaction {
    async fn set_string(&mut self, key: &str, value: &str) -> Result<()> {
        let tx = self.active()?;
        SqliteSettingsStore::upsert(&mut **tx, key, value, TYPE_STRING).await
    }

    async fn set_i64(&mut self, key: &str, value: i64) -> Result<()> {
        let tx = self.active()?;
        SqliteSettingsStore::upsert(&mut **tx, key, &value.to_string(), TYPE_I64).await
    }

    async fn delete(&mut self, key: &str) -> Result<()> {
        let tx = self.active()?;
        SqliteSettingsStore::remove(&mut **tx, key).await
    }

    async fn commit(mut self: Box<Self>) -> Result<()> {
        let tx = self.tx.take().ok_or_else(|| {
            BridgeError::OperationFailed("Transaction already finished".to_string())
        })?;

        tx.commit()
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Failed to commit: {}", e)))?;

        debug!("Committed settings transaction");
        Ok(())
    }

    async fn rollback(mut self: Box<Self>) -> Result<()> {
        let tx = self.tx.take().ok_or_else(|| {
            BridgeError::OperationFailed("Transaction already finished".to_string())
        })?;

        tx.rollback()
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Failed to rollback: {}", e)))?;

        debug!("Rolled back settings transaction");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_string_operations() {
        let store = SqliteSettingsStore::in_memory().await.unwrap();

        store
            .set_string("collection.sync.statuses", "own,played")
            .await
            .unwrap();
        assert_eq!(
            store.get_string("collection.sync.statuses").await.unwrap(),
            Some("own,played".to_string())
        );

        store.delete("collection.sync.statuses").await.unwrap();
        assert_eq!(store.get_string("collection.sync.statuses").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_i64_overwrite_and_type_mismatch() {
        let store = SqliteSettingsStore::in_memory().await.unwrap();

        store.set_i64("collection.sync.session", 10).await.unwrap();
        store.set_i64("collection.sync.session", 20).await.unwrap();
        assert_eq!(store.get_i64("collection.sync.session").await.unwrap(), Some(20));

        let err = store.get_string("collection.sync.session").await.unwrap_err();
        assert!(matches!(err, BridgeError::TypeMismatch { .. }));
    }

    #[tokio::test]
    async fn test_list_and_has_key() {
        let store = SqliteSettingsStore::in_memory().await.unwrap();

        store.set_i64("b", 2).await.unwrap();
        store.set_i64("a", 1).await.unwrap();

        assert_eq!(store.list_keys().await.unwrap(), vec!["a", "b"]);
        assert!(store.has_key("a").await.unwrap());
        assert!(!store.has_key("c").await.unwrap());
    }

    #[tokio::test]
    async fn test_transaction_commit_is_atomic() {
        let store = SqliteSettingsStore::in_memory().await.unwrap();
        store.set_i64("session", 500).await.unwrap();

        let mut tx = store.begin_transaction().await.unwrap();
        tx.set_i64("last_complete", 500).await.unwrap();
        tx.set_i64("session", 0).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(store.get_i64("last_complete").await.unwrap(), Some(500));
        assert_eq!(store.get_i64("session").await.unwrap(), Some(0));
    }

    #[tokio::test]
    async fn test_transaction_rollback_discards_writes() {
        let store = SqliteSettingsStore::in_memory().await.unwrap();
        store.set_i64("session", 500).await.unwrap();

        let mut tx = store.begin_transaction().await.unwrap();
        tx.delete("session").await.unwrap();
        tx.set_string("other", "x").await.unwrap();
        tx.rollback().await.unwrap();

        assert_eq!(store.get_i64("session").await.unwrap(), Some(500));
        assert!(!store.has_key("other").await.unwrap());
    }

    #[tokio::test]
    async fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs").join("settings.db");

        {
            let store = SqliteSettingsStore::new(path.clone()).await.unwrap();
            store
                .set_i64("collection.sync.partition.all.own", 1234)
                .await
                .unwrap();
            store.close().await;
        }

        let reopened = SqliteSettingsStore::new(path).await.unwrap();
        assert_eq!(
            reopened
                .get_i64("collection.sync.partition.all.own")
                .await
                .unwrap(),
            Some(1234)
        );
    }
}
