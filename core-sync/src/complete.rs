//! # Complete Collection Sync
//!
//! Mirrors the whole remote collection for every configured status and then
//! deletes local rows the run did not touch.
//!
//! ## Workflow
//!
//! 1. Open a session (or resume the one left open by an interrupted run).
//!    The session timestamp is stamped on every row the run writes.
//! 2. For each status, `played` first, fetch the base partition and then the
//!    accessory partition. Statuses handled earlier in the run are excluded
//!    with `<status>=0`, so each item is downloaded once.
//! 3. Partitions whose timestamp is already at or past the session were
//!    finished by an earlier attempt and are not fetched again.
//! 4. Once every partition is done, rows stamped before the session are
//!    deleted and the session is closed.
//!
//! Any failed partition cancels the run and leaves the session open; the next
//! run picks up where this one stopped.

use bridge_traits::collection::CollectionRequest;
use core_async::sync::CancellationToken;
use core_runtime::events::{CollectionEvent, CoreEvent};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::context::SyncContext;
use crate::error::{Result, SyncError};
use crate::job::{SkipReason, SyncKind, SyncOutcome, SyncRunId};
use crate::persister::CollectionPersister;
use crate::run::{PartitionResult, SyncRun};
use crate::status::{order_statuses, CollectionSubtype};

pub struct CompleteCollectionSync {
    run: SyncRun,
}

impl CompleteCollectionSync {
    pub fn new(ctx: Arc<SyncContext>, token: CancellationToken) -> Self {
        Self {
            run: SyncRun::new(ctx, SyncRunId::new(), SyncKind::Complete, token),
        }
    }

    pub fn run_id(&self) -> SyncRunId {
        self.run.run_id
    }

    /// Run the sync to the end, or until it is cancelled or a partition
    /// fails. Never returns an error.
    #[instrument(skip(self), fields(run_id = %self.run.run_id))]
    pub async fn execute(&self) -> SyncOutcome {
        info!("Syncing full collection list...");
        self.run.emit_started();

        let result = self.sync().await;
        let outcome = self.run.finish(result);

        info!("Syncing full collection list...complete!");
        outcome
    }

    async fn sync(&self) -> Result<()> {
        let ctx = &self.run.ctx;
        self.run.check_cancelled()?;

        let statuses = order_statuses(&ctx.prefs.configured_statuses().await?);
        if statuses.is_empty() {
            return Err(SyncError::Skipped(SkipReason::SyncDisabled));
        }

        let session = self.open_session().await?;
        let persister = ctx
            .persister_builder()
            .include_stats()
            .include_private_info()
            .build();

        for (i, status) in statuses.iter().enumerate() {
            if i > 0 {
                self.run.check_cancelled()?;
                self.run.progress(format!(
                    "Syncing '{}' collection",
                    ctx.catalog.describe(status)
                ));
                self.run.pause().await?;
            }

            let excluded = &statuses[..i];
            self.sync_by_status(
                &persister,
                session,
                CollectionSubtype::Unspecified,
                status,
                excluded,
            )
            .await?;

            self.run.progress(format!(
                "Syncing '{}' accessories",
                ctx.catalog.describe(status)
            ));
            self.run.pause().await?;

            self.sync_by_status(
                &persister,
                session,
                CollectionSubtype::Accessory,
                status,
                excluded,
            )
            .await?;
        }

        self.run.check_cancelled()?;
        self.delete_stale(session).await?;
        ctx.prefs.finalize_complete(session).await?;

        Ok(())
    }

    /// Session timestamp for this run, opening a new session when none is
    /// left over from an interrupted run.
    async fn open_session(&self) -> Result<i64> {
        let ctx = &self.run.ctx;

        let session = ctx.prefs.session().await?;
        if session != 0 {
            info!(session, "Resuming interrupted collection sync");
            return Ok(session);
        }

        let now = ctx.now_millis();
        let last_complete = ctx.prefs.last_complete().await?;
        let interval = ctx.config.full_sync_interval.as_millis() as i64;
        if last_complete > 0 && now - last_complete < interval {
            debug!(last_complete, now, "Complete sync is not due yet");
            return Err(SyncError::Skipped(SkipReason::RecentlyCompleted));
        }

        ctx.prefs.set_session(now).await?;
        Ok(now)
    }

    /// Fetch and save one (subtype, status) partition.
    ///
    /// Returns `Ok` even when the partition failed; a failure is visible
    /// through the cancelled token.
    async fn sync_by_status<S: AsRef<str>>(
        &self,
        persister: &CollectionPersister,
        session: i64,
        subtype: CollectionSubtype,
        status: &str,
        excluded: &[S],
    ) -> Result<()> {
        let ctx = &self.run.ctx;

        if self.run.is_cancelled() {
            debug!(status, %subtype, "Run cancelled; not syncing partition");
            return Ok(());
        }
        if status.is_empty() {
            debug!(%subtype, "Empty status; not syncing partition");
            return Ok(());
        }

        let synced = ctx.prefs.partition_timestamp(subtype, status).await?;
        if synced >= session {
            info!(
                "Skipping {}, already synced this session",
                self.run.partition_label(subtype, status)
            );
            return Ok(());
        }

        let request = excluded.iter().fold(
            CollectionRequest::new(ctx.username.as_str())
                .subtype(subtype.as_param())
                .stats()
                .show_private()
                .include_status(status),
            |request, excluded| request.exclude_status(excluded.as_ref()),
        );

        persister.reset_timestamp_to(session);
        if let PartitionResult::Saved(count) = self
            .run
            .fetch_and_save(persister, &request, subtype, status)
            .await
        {
            debug!(count, status, %subtype, "Marking partition synced");
            ctx.prefs
                .set_partition_timestamp(subtype, status, persister.timestamp())
                .await?;
        }

        Ok(())
    }

    async fn delete_stale(&self, session: i64) -> Result<()> {
        let ctx = &self.run.ctx;

        let deleted = ctx.collection_repository.delete_updated_before(session).await?;
        self.run.counters.add_deletes(deleted);
        ctx.event_bus
            .emit(CoreEvent::Collection(CollectionEvent::StaleItemsDeleted {
                count: deleted,
            }))
            .ok();

        info!(deleted, "Deleted collection items not seen in this sync");
        Ok(())
    }
}
