//! # Sync Runs
//!
//! Identity, statistics and outcome of one collection sync run.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Unique identifier for a sync run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SyncRunId(Uuid);

impl SyncRunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SyncRunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SyncRunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncKind {
    /// Every configured status, deleting whatever was not seen
    Complete,
    /// Only items modified since the last partial sync
    ModifiedSince,
}

impl SyncKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncKind::Complete => "complete",
            SyncKind::ModifiedSince => "modified_since",
        }
    }
}

impl fmt::Display for SyncKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counters reported when a run ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStats {
    /// Items received and saved
    pub num_updates: u64,
    /// Failed partition fetches (at most one per run, since a failure cancels)
    pub num_io_errors: u64,
    /// Stale rows deleted by the final cleanup
    pub num_deletes: u64,
}

/// Live counters shared by the steps of one run.
#[derive(Debug, Default)]
pub(crate) struct SyncCounters {
    updates: AtomicU64,
    io_errors: AtomicU64,
    deletes: AtomicU64,
}

impl SyncCounters {
    pub(crate) fn add_updates(&self, count: u64) {
        self.updates.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn add_io_error(&self) {
        self.io_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_deletes(&self, count: u64) {
        self.deletes.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> SyncStats {
        SyncStats {
            num_updates: self.updates.load(Ordering::Relaxed),
            num_io_errors: self.io_errors.load(Ordering::Relaxed),
            num_deletes: self.deletes.load(Ordering::Relaxed),
        }
    }
}

/// Why a run did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// No statuses configured
    SyncDisabled,
    /// A complete sync finished inside the full-sync interval and no session
    /// is open
    RecentlyCompleted,
    /// Modified-since sync with no earlier sync to measure from
    NoBaseline,
    /// Modified-since sync right after a complete sync
    CooldownActive,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            SkipReason::SyncDisabled => "collection not set to sync",
            SkipReason::RecentlyCompleted => "complete sync finished recently",
            SkipReason::NoBaseline => "no previous sync to continue from",
            SkipReason::CooldownActive => "complete sync just finished",
        };
        f.write_str(reason)
    }
}

/// Result of one run. Never an error: failures end as `Interrupted` with
/// `num_io_errors > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncOutcome {
    Completed(SyncStats),
    Skipped(SkipReason),
    /// Cancelled externally or by a failed partition; the session stays open
    Interrupted(SyncStats),
}

impl SyncOutcome {
    pub fn stats(&self) -> SyncStats {
        match self {
            SyncOutcome::Completed(stats) | SyncOutcome::Interrupted(stats) => *stats,
            SyncOutcome::Skipped(_) => SyncStats::default(),
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, SyncOutcome::Completed(_))
    }
}
