//! # Repositories
//!
//! Repository traits and their SQLite implementations.
//!
//! - `CollectionRepository` - collection entries, keyed by collection id
//! - `GameRankRepository` - per-game rankings reported with stats
//!
//! Batch writes run in a single transaction: either the whole batch lands or
//! none of it does.

pub mod collection;
pub mod game_rank;
pub mod pagination;

pub use collection::{CollectionRepository, SqliteCollectionRepository, UpsertOptions};
pub use game_rank::{GameRankRepository, SqliteGameRankRepository};
pub use pagination::{Page, PageRequest};
