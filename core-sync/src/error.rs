use bridge_traits::error::BridgeError;
use core_library::LibraryError;
use thiserror::Error;

use crate::job::SkipReason;

/// Internal failure modes of a sync run.
///
/// Only [`SyncError::SyncInProgress`], [`SyncError::RunNotFound`] and
/// settings/library failures outside a run reach callers; inside a run every
/// variant is folded into a [`crate::SyncOutcome`].
#[derive(Error, Debug)]
pub enum SyncError {
    /// Network I/O failure or unreadable response
    #[error("Transport error: {0}")]
    Transport(String),

    /// The server answered with something other than 200
    #[error("Remote error: HTTP {status_code}")]
    Remote { status_code: u16 },

    #[error("Sync interrupted")]
    Interrupted,

    #[error("Sync skipped: {0}")]
    Skipped(SkipReason),

    #[error("Settings error: {0}")]
    Settings(#[from] BridgeError),

    #[error("Library error: {0}")]
    Library(#[from] LibraryError),

    #[error("A collection sync is already in progress")]
    SyncInProgress,

    #[error("Sync run {run_id} not found")]
    RunNotFound { run_id: String },
}

pub type Result<T> = std::result::Result<T, SyncError>;
