//! # Run Plumbing
//!
//! Pieces shared by the complete and modified-since syncs: progress and
//! lifecycle events, the pause between requests, fetching and saving one
//! partition, and turning the run's result into a [`SyncOutcome`].

use bridge_traits::collection::CollectionRequest;
use core_async::sync::CancellationToken;
use core_async::time::{sleep_or_cancelled, Instant, SleepOutcome};
use core_runtime::events::{CollectionEvent, CoreEvent, SyncEvent};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::context::SyncContext;
use crate::error::{Result, SyncError};
use crate::job::{SyncCounters, SyncKind, SyncOutcome, SyncRunId};
use crate::persister::CollectionPersister;
use crate::status::CollectionSubtype;

/// What happened to one partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PartitionResult {
    Saved(u64),
    Empty,
    /// The run has been cancelled
    Failed,
}

pub(crate) struct SyncRun {
    pub(crate) ctx: Arc<SyncContext>,
    pub(crate) run_id: SyncRunId,
    pub(crate) kind: SyncKind,
    pub(crate) token: CancellationToken,
    pub(crate) counters: SyncCounters,
    started: Instant,
}

impl SyncRun {
    pub(crate) fn new(
        ctx: Arc<SyncContext>,
        run_id: SyncRunId,
        kind: SyncKind,
        token: CancellationToken,
    ) -> Self {
        Self {
            ctx,
            run_id,
            kind,
            token,
            counters: SyncCounters::default(),
            started: Instant::now(),
        }
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// `Err(Interrupted)` once the run has been cancelled.
    pub(crate) fn check_cancelled(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(SyncError::Interrupted)
        } else {
            Ok(())
        }
    }

    fn emit(&self, event: CoreEvent) {
        self.ctx.event_bus.emit(event).ok();
    }

    pub(crate) fn progress(&self, message: impl Into<String>) {
        let message = message.into();
        debug!(run_id = %self.run_id, "{}", message);
        self.emit(CoreEvent::Sync(SyncEvent::Progress {
            run_id: self.run_id.to_string(),
            message,
        }));
    }

    /// Wait out the pause between requests.
    pub(crate) async fn pause(&self) -> Result<()> {
        match sleep_or_cancelled(self.ctx.config.partition_pause, &self.token).await {
            SleepOutcome::Elapsed => Ok(()),
            SleepOutcome::Cancelled => Err(SyncError::Interrupted),
        }
    }

    pub(crate) fn partition_label(&self, subtype: CollectionSubtype, status: &str) -> String {
        format!("'{}' {}", self.ctx.catalog.describe(status), subtype.description())
    }

    /// Fetch one partition and save what comes back.
    ///
    /// Failures never propagate: they are reported, counted and turned into a
    /// cancellation of the whole run.
    pub(crate) async fn fetch_and_save(
        &self,
        persister: &CollectionPersister,
        request: &CollectionRequest,
        subtype: CollectionSubtype,
        status: &str,
    ) -> PartitionResult {
        let label = self.partition_label(subtype, status);
        self.progress(format!("Downloading {}", label));

        let fetch = match self.ctx.provider.fetch_collection(request).await {
            Ok(fetch) => fetch,
            Err(e) => return self.fail(&label, SyncError::Transport(e.to_string())),
        };

        if !fetch.is_success() {
            let status_code = fetch.status_code;
            return self.fail(&label, SyncError::Remote { status_code });
        }

        let items = fetch.collection.map(|c| c.items).unwrap_or_default();
        if items.is_empty() {
            info!(run_id = %self.run_id, "No {} in the collection", label);
            return PartitionResult::Empty;
        }

        self.progress(format!("Saving {} {}", items.len(), label));

        let count = match persister.save(&items).await {
            Ok(written) => written,
            Err(e) => return self.fail(&label, e),
        };

        self.counters.add_updates(count);
        self.emit(CoreEvent::Collection(CollectionEvent::ItemsSaved {
            status: status.to_string(),
            subtype: subtype.key_segment().to_string(),
            count,
        }));
        info!(run_id = %self.run_id, count, "Saved {}", label);

        PartitionResult::Saved(count)
    }

    fn fail(&self, label: &str, error: SyncError) -> PartitionResult {
        let status_code = match error {
            SyncError::Remote { status_code } => Some(status_code),
            _ => None,
        };
        let message = error.to_string();
        warn!(
            run_id = %self.run_id,
            status_code,
            "Failed to sync {}: {}",
            label,
            message
        );
        self.emit(CoreEvent::Sync(SyncEvent::PartitionFailed {
            run_id: self.run_id.to_string(),
            detail: label.to_string(),
            status_code,
            message,
        }));
        self.counters.add_io_error();
        self.token.cancel();
        PartitionResult::Failed
    }

    pub(crate) fn emit_started(&self) {
        self.emit(CoreEvent::Sync(SyncEvent::Started {
            run_id: self.run_id.to_string(),
            kind: self.kind.to_string(),
        }));
    }

    /// Map the body's result onto an outcome and emit the closing event.
    pub(crate) fn finish(&self, result: Result<()>) -> SyncOutcome {
        let stats = self.counters.snapshot();
        let run_id = self.run_id.to_string();

        match result {
            Ok(()) => {
                let duration_secs = self.started.elapsed().as_secs();
                self.emit(CoreEvent::Sync(SyncEvent::Completed {
                    run_id,
                    items_updated: stats.num_updates,
                    items_deleted: stats.num_deletes,
                    duration_secs,
                }));
                SyncOutcome::Completed(stats)
            }
            Err(SyncError::Skipped(reason)) => {
                info!(run_id = %self.run_id, kind = %self.kind, "Skipping sync: {}", reason);
                self.emit(CoreEvent::Sync(SyncEvent::Skipped {
                    run_id,
                    reason: reason.to_string(),
                }));
                SyncOutcome::Skipped(reason)
            }
            Err(SyncError::Interrupted) => self.interrupted(run_id, stats),
            Err(e) => {
                error!(run_id = %self.run_id, kind = %self.kind, "Sync aborted: {}", e);
                self.counters.add_io_error();
                self.interrupted(run_id, self.counters.snapshot())
            }
        }
    }

    fn interrupted(&self, run_id: String, stats: crate::job::SyncStats) -> SyncOutcome {
        info!(
            run_id = %self.run_id,
            updates = stats.num_updates,
            io_errors = stats.num_io_errors,
            "Sync interrupted"
        );
        self.emit(CoreEvent::Sync(SyncEvent::Cancelled {
            run_id,
            items_updated: stats.num_updates,
            io_errors: stats.num_io_errors,
        }));
        SyncOutcome::Interrupted(stats)
    }
}
