//! # Database Connection Pool
//!
//! SQLite pool setup for the collection database.
//!
//! - WAL journal with `synchronous = NORMAL`
//! - Migrations from `migrations/` are embedded and applied on open
//! - A `SELECT 1` health check before the pool is handed out
//!
//! ```rust,ignore
//! use core_library::db::{create_pool, DatabaseConfig};
//!
//! let pool = create_pool(DatabaseConfig::new("collection.db")).await?;
//! ```
//!
//! Tests use [`create_test_pool`], which pins an in-memory database to a
//! single connection.

use crate::{LibraryError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Sqlite};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Database configuration for the SQLite connection pool
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// `sqlite:<path>` or `sqlite::memory:`
    pub database_url: String,

    pub min_connections: u32,
    pub max_connections: u32,

    /// Maximum time to wait for a connection from the pool
    pub acquire_timeout: Duration,

    pub max_lifetime: Option<Duration>,
    pub idle_timeout: Option<Duration>,

    /// Number of prepared statements cached per connection
    pub statement_cache_capacity: usize,
}

impl DatabaseConfig {
    /// Configuration for a database file at `database_path`.
    pub fn new(database_path: impl Into<PathBuf>) -> Self {
        let path = database_path.into();

        Self {
            database_url: format!("sqlite:{}", path.display()),
            min_connections: 1,
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
            max_lifetime: Some(Duration::from_secs(1800)),
            idle_timeout: Some(Duration::from_secs(600)),
            statement_cache_capacity: 100,
        }
    }

    /// In-memory database.
    ///
    /// Every connection to `sqlite::memory:` opens its own empty database, so
    /// the pool is held at exactly one connection that never expires.
    pub fn in_memory() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            min_connections: 1,
            max_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            max_lifetime: None,
            idle_timeout: None,
            statement_cache_capacity: 100,
        }
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn statement_cache_capacity(mut self, capacity: usize) -> Self {
        self.statement_cache_capacity = capacity;
        self
    }

    fn is_in_memory(&self) -> bool {
        self.database_url.contains(":memory:")
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::in_memory()
    }
}

/// Create a configured SQLite connection pool, run migrations and check
/// that the database answers.
///
/// # Errors
///
/// Fails if the database cannot be opened, a migration fails to apply, or the
/// health check query fails.
pub async fn create_pool(config: DatabaseConfig) -> Result<Pool<Sqlite>> {
    info!(
        database_url = %config.database_url,
        min_connections = config.min_connections,
        max_connections = config.max_connections,
        "Creating database connection pool"
    );

    let mut connect_options =
        SqliteConnectOptions::from_str(&config.database_url).map_err(LibraryError::Database)?;

    connect_options = connect_options
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true)
        .create_if_missing(true)
        .pragma("cache_size", "-16000")
        .statement_cache_capacity(config.statement_cache_capacity);

    if !config.is_in_memory() {
        connect_options = connect_options.journal_mode(SqliteJournalMode::Wal);
    }

    let max_connections = if config.is_in_memory() {
        1
    } else {
        config.max_connections.max(1)
    };

    let pool = SqlitePoolOptions::new()
        .min_connections(config.min_connections.min(max_connections))
        .max_connections(max_connections)
        .acquire_timeout(config.acquire_timeout)
        .max_lifetime(config.max_lifetime)
        .idle_timeout(config.idle_timeout)
        .connect_with(connect_options)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to create connection pool");
            LibraryError::Database(e)
        })?;

    info!(connections = pool.size(), "Database connection pool created");

    run_migrations(&pool).await?;
    health_check(&pool).await?;

    Ok(pool)
}

/// In-memory pool with migrations applied.
pub async fn create_test_pool() -> Result<Pool<Sqlite>> {
    create_pool(DatabaseConfig::in_memory()).await
}

async fn run_migrations(pool: &Pool<Sqlite>) -> Result<()> {
    info!("Running database migrations");

    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Migration failed");
            LibraryError::Migration(e)
        })?;

    info!("Database migrations completed");
    Ok(())
}

async fn health_check(pool: &Pool<Sqlite>) -> Result<()> {
    debug!("Performing database health check");

    sqlx::query("SELECT 1").fetch_one(pool).await.map_err(|e| {
        warn!(error = %e, "Database health check failed");
        LibraryError::Database(e)
    })?;

    Ok(())
}
