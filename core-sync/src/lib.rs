//! # Collection Sync Module
//!
//! Mirrors a BoardGameGeek collection into the local library.
//!
//! ## Overview
//!
//! The remote collection is fetched one partition at a time, where a
//! partition is one status (owned, wishlist, played, ...) in one subtype
//! (base items or accessories). Progress is recorded per partition, so an
//! interrupted sync resumes without downloading finished partitions again.
//!
//! ## Components
//!
//! - **Status Catalog** (`status`): known statuses, labels, ordering and subtypes
//! - **Sync Preferences** (`prefs`): durable session, last-sync and partition timestamps
//! - **Collection Persister** (`persister`): maps fetched items onto library rows
//! - **Complete Sync** (`complete`): full mirror with stale-row cleanup
//! - **Modified-Since Sync** (`modified_since`): incremental top-up between full syncs
//! - **Sync Coordinator** (`coordinator`): one active run at a time, cancel and clear

pub mod complete;
pub mod context;
pub mod coordinator;
pub mod error;
pub mod job;
pub mod modified_since;
pub mod persister;
pub mod prefs;
mod run;
pub mod status;

pub use complete::CompleteCollectionSync;
pub use context::SyncContext;
pub use coordinator::{ClearStats, SyncCoordinator};
pub use error::{Result, SyncError};
pub use job::{SkipReason, SyncKind, SyncOutcome, SyncRunId, SyncStats};
pub use modified_since::ModifiedSinceSync;
pub use persister::{CollectionPersister, CollectionPersisterBuilder};
pub use prefs::SyncPreferences;
pub use status::{
    normalize_status, order_statuses, parse_status_list, CollectionSubtype, StatusCatalog,
    PLAYED,
};
