//! # Modified-Since Sync
//!
//! Cheap top-up between complete syncs: fetches only items changed since the
//! previous partial sync. Nothing is deleted and no session is opened.

use bridge_traits::collection::CollectionRequest;
use chrono::{DateTime, TimeZone, Utc};
use core_async::sync::CancellationToken;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::context::SyncContext;
use crate::error::{Result, SyncError};
use crate::job::{SkipReason, SyncKind, SyncOutcome, SyncRunId};
use crate::persister::CollectionPersister;
use crate::run::SyncRun;
use crate::status::{order_statuses, CollectionSubtype};

pub struct ModifiedSinceSync {
    run: SyncRun,
}

impl ModifiedSinceSync {
    pub fn new(ctx: Arc<SyncContext>, token: CancellationToken) -> Self {
        Self {
            run: SyncRun::new(ctx, SyncRunId::new(), SyncKind::ModifiedSince, token),
        }
    }

    pub fn run_id(&self) -> SyncRunId {
        self.run.run_id
    }

    #[instrument(skip(self), fields(run_id = %self.run.run_id))]
    pub async fn execute(&self) -> SyncOutcome {
        info!("Syncing recently modified collection items...");
        self.run.emit_started();

        let result = self.sync().await;
        let outcome = self.run.finish(result);

        info!("Syncing recently modified collection items...complete!");
        outcome
    }

    async fn sync(&self) -> Result<()> {
        let ctx = &self.run.ctx;
        self.run.check_cancelled()?;

        let statuses = order_statuses(&ctx.prefs.configured_statuses().await?);
        if statuses.is_empty() {
            return Err(SyncError::Skipped(SkipReason::SyncDisabled));
        }

        let last_partial = ctx.prefs.last_partial().await?;
        if last_partial == 0 {
            return Err(SyncError::Skipped(SkipReason::NoBaseline));
        }

        let now = ctx.now_millis();
        let last_complete = ctx.prefs.last_complete().await?;
        let cooldown = ctx.config.partial_sync_cooldown.as_millis() as i64;
        if now - last_complete < cooldown {
            debug!(last_complete, now, "Complete sync finished recently");
            return Err(SyncError::Skipped(SkipReason::CooldownActive));
        }

        let since = since_datetime(last_partial);
        info!(%since, "Fetching collection items modified since last sync");

        let persister = ctx.persister_builder().include_stats().build();
        persister.reset_timestamp();

        for (i, status) in statuses.iter().enumerate() {
            if i > 0 {
                self.run.check_cancelled()?;
                self.run.progress(format!(
                    "Syncing modified '{}' items",
                    ctx.catalog.describe(status)
                ));
                self.run.pause().await?;
            }

            self.sync_partition(&persister, since, CollectionSubtype::Unspecified, status)
                .await;
            self.run.pause().await?;
            self.sync_partition(&persister, since, CollectionSubtype::Accessory, status)
                .await;
        }

        self.run.check_cancelled()?;
        ctx.prefs.set_last_partial(persister.timestamp()).await?;

        Ok(())
    }

    async fn sync_partition(
        &self,
        persister: &CollectionPersister,
        since: DateTime<Utc>,
        subtype: CollectionSubtype,
        status: &str,
    ) {
        if self.run.is_cancelled() || status.is_empty() {
            return;
        }

        let request = CollectionRequest::new(self.run.ctx.username.as_str())
            .subtype(subtype.as_param())
            .stats()
            .include_status(status)
            .modified_since(since);

        self.run
            .fetch_and_save(persister, &request, subtype, status)
            .await;
    }
}

fn since_datetime(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis).single().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_since_datetime() {
        let since = since_datetime(1_709_802_301_000);
        assert_eq!(
            since.format("%Y-%m-%d %H:%M:%S").to_string(),
            "2024-03-07 09:05:01"
        );
    }
}
