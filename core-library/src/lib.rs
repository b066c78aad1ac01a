//! # Collection Library
//!
//! Owns the local collection database: schema, migrations, and the
//! repositories the sync engine writes through.
//!
//! ## Overview
//!
//! - `collection` holds one row per collection entry, stamped with the
//!   timestamp of the sync run that last wrote it (`updated_list`)
//! - `game_ranks` holds the BoardGameGeek ranks reported alongside stats
//! - Pagination helpers for listing the local collection

pub mod db;
pub mod error;
pub mod models;
pub mod repositories;

pub use db::{create_pool, create_test_pool, DatabaseConfig};
pub use error::{LibraryError, Result};
pub use models::{CollectionItem, GameRank};
pub use repositories::{
    CollectionRepository, GameRankRepository, Page, PageRequest, SqliteCollectionRepository,
    SqliteGameRankRepository, UpsertOptions,
};
