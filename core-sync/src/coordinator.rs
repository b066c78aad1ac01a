//! # Sync Coordinator
//!
//! Owns the single active-run slot. At most one collection sync (complete or
//! modified-since) runs at a time; a second start is refused with
//! [`SyncError::SyncInProgress`] instead of relying on the session timestamp
//! to keep two runs apart.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_sync::SyncCoordinator;
//!
//! # async fn example(coordinator: SyncCoordinator) -> core_sync::Result<()> {
//! // Await a run inline
//! let outcome = coordinator.run_complete_sync().await?;
//!
//! // Or start one in the background and cancel it later
//! let run_id = coordinator.start_modified_since_sync().await?;
//! if let Some(cancelled) = coordinator.cancel_sync().await {
//!     assert_eq!(cancelled, run_id);
//! }
//! # Ok(())
//! # }
//! ```

use core_async::sync::{CancellationToken, Mutex};
use core_runtime::events::{CollectionEvent, CoreEvent};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::complete::CompleteCollectionSync;
use crate::context::SyncContext;
use crate::error::{Result, SyncError};
use crate::job::{SyncKind, SyncOutcome, SyncRunId};
use crate::modified_since::ModifiedSinceSync;

#[derive(Clone)]
struct ActiveRun {
    run_id: SyncRunId,
    kind: SyncKind,
    token: CancellationToken,
}

/// Counts returned by [`SyncCoordinator::clear_collection_data`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearStats {
    pub items_removed: u64,
    pub ranks_removed: u64,
    pub timestamps_cleared: usize,
}

/// Either sync, behind one interface so runs share the slot handling.
enum SyncJob {
    Complete(CompleteCollectionSync),
    ModifiedSince(ModifiedSinceSync),
}

impl SyncJob {
    fn new(kind: SyncKind, ctx: Arc<SyncContext>, token: CancellationToken) -> Self {
        match kind {
            SyncKind::Complete => SyncJob::Complete(CompleteCollectionSync::new(ctx, token)),
            SyncKind::ModifiedSince => SyncJob::ModifiedSince(ModifiedSinceSync::new(ctx, token)),
        }
    }

    fn run_id(&self) -> SyncRunId {
        match self {
            SyncJob::Complete(sync) => sync.run_id(),
            SyncJob::ModifiedSince(sync) => sync.run_id(),
        }
    }

    async fn execute(&self) -> SyncOutcome {
        match self {
            SyncJob::Complete(sync) => sync.execute().await,
            SyncJob::ModifiedSince(sync) => sync.execute().await,
        }
    }
}

#[derive(Clone)]
pub struct SyncCoordinator {
    ctx: Arc<SyncContext>,
    active_run: Arc<Mutex<Option<ActiveRun>>>,
}

impl SyncCoordinator {
    pub fn new(ctx: Arc<SyncContext>) -> Self {
        Self {
            ctx,
            active_run: Arc::new(Mutex::new(None)),
        }
    }

    pub fn context(&self) -> &Arc<SyncContext> {
        &self.ctx
    }

    /// Run a complete sync and wait for it to finish.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::SyncInProgress`] if another run holds the slot.
    pub async fn run_complete_sync(&self) -> Result<SyncOutcome> {
        self.run_inline(SyncKind::Complete).await
    }

    /// Run a modified-since sync and wait for it to finish.
    pub async fn run_modified_since_sync(&self) -> Result<SyncOutcome> {
        self.run_inline(SyncKind::ModifiedSince).await
    }

    /// Start a complete sync in the background.
    pub async fn start_complete_sync(&self) -> Result<SyncRunId> {
        self.start_background(SyncKind::Complete).await
    }

    /// Start a modified-since sync in the background.
    pub async fn start_modified_since_sync(&self) -> Result<SyncRunId> {
        self.start_background(SyncKind::ModifiedSince).await
    }

    async fn claim(&self, kind: SyncKind) -> Result<SyncJob> {
        let mut active_run = self.active_run.lock().await;
        if let Some(active) = active_run.as_ref() {
            info!(
                active_run_id = %active.run_id,
                active_kind = %active.kind,
                requested = %kind,
                "Collection sync already running"
            );
            return Err(SyncError::SyncInProgress);
        }

        let token = CancellationToken::new();
        let job = SyncJob::new(kind, Arc::clone(&self.ctx), token.clone());
        *active_run = Some(ActiveRun {
            run_id: job.run_id(),
            kind,
            token,
        });

        Ok(job)
    }

    async fn release(&self, run_id: SyncRunId) {
        let mut active_run = self.active_run.lock().await;
        if active_run.as_ref().map(|a| a.run_id) == Some(run_id) {
            *active_run = None;
        }
    }

    #[instrument(skip(self))]
    async fn run_inline(&self, kind: SyncKind) -> Result<SyncOutcome> {
        let job = self.claim(kind).await?;
        let outcome = job.execute().await;
        self.release(job.run_id()).await;
        Ok(outcome)
    }

    #[instrument(skip(self))]
    async fn start_background(&self, kind: SyncKind) -> Result<SyncRunId> {
        let job = self.claim(kind).await?;
        let run_id = job.run_id();

        let coordinator = self.clone();
        core_async::task::spawn(async move {
            let outcome = job.execute().await;
            coordinator.release(run_id).await;
            info!(%run_id, ?outcome, "Background collection sync finished");
        });

        info!(%run_id, %kind, "Started background collection sync");
        Ok(run_id)
    }

    /// Cancel the active run, if any. Cancelling is cooperative: the run stops
    /// at its next checkpoint or pause.
    ///
    /// # Returns
    /// Id of the cancelled run, `None` when nothing was running
    pub async fn cancel_sync(&self) -> Option<SyncRunId> {
        let active = self.active_run.lock().await.clone();
        active.map(|active| {
            active.token.cancel();
            info!(run_id = %active.run_id, "Cancelling collection sync");
            active.run_id
        })
    }

    /// Cancel a specific run.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::RunNotFound`] when `run_id` is not the active run.
    pub async fn cancel_run(&self, run_id: SyncRunId) -> Result<()> {
        let active = self.active_run.lock().await.clone();
        match active {
            Some(active) if active.run_id == run_id => {
                active.token.cancel();
                info!(%run_id, "Cancelling collection sync");
                Ok(())
            }
            _ => Err(SyncError::RunNotFound {
                run_id: run_id.to_string(),
            }),
        }
    }

    pub async fn is_sync_active(&self) -> bool {
        self.active_run.lock().await.is_some()
    }

    pub async fn active_run_id(&self) -> Option<SyncRunId> {
        self.active_run.lock().await.as_ref().map(|a| a.run_id)
    }

    /// Drop the local collection and every sync timestamp, so the next
    /// complete sync starts from scratch.
    ///
    /// The slot is held for the duration, so no run can start halfway.
    #[instrument(skip(self))]
    pub async fn clear_collection_data(&self) -> Result<ClearStats> {
        let active_run = self.active_run.lock().await;
        if active_run.is_some() {
            return Err(SyncError::SyncInProgress);
        }

        let timestamps_cleared = self.ctx.prefs.clear_collection_timestamps().await?;
        let items_removed = self.ctx.collection_repository.delete_all().await?;
        let ranks_removed = self.ctx.rank_repository.delete_all().await?;

        self.ctx
            .event_bus
            .emit(CoreEvent::Collection(CollectionEvent::Cleared {
                items_removed,
                ranks_removed,
            }))
            .ok();

        info!(items_removed, ranks_removed, "Cleared local collection");
        drop(active_run);

        Ok(ClearStats {
            items_removed,
            ranks_removed,
            timestamps_cleared,
        })
    }
}
