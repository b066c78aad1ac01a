//! Time-related abstractions.
//!
//! Besides the tokio re-exports this module owns [`sleep_or_cancelled`], the
//! bounded wait used between remote requests. It never errors: callers get a
//! [`SleepOutcome`] telling them whether the full duration elapsed or the
//! token fired first.

pub use tokio::time::{interval, sleep, sleep_until, timeout, Interval, Sleep, Timeout};

pub use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use crate::sync::CancellationToken;

/// How an interruptible sleep ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepOutcome {
    /// The whole duration passed.
    Elapsed,
    /// The token was cancelled before (or while) sleeping.
    Cancelled,
}

impl SleepOutcome {
    pub fn is_cancelled(self) -> bool {
        matches!(self, SleepOutcome::Cancelled)
    }
}

/// Sleeps for `duration` unless `token` is cancelled first.
///
/// An already-cancelled token returns [`SleepOutcome::Cancelled`] without
/// waiting at all.
pub async fn sleep_or_cancelled(duration: Duration, token: &CancellationToken) -> SleepOutcome {
    if token.is_cancelled() {
        return SleepOutcome::Cancelled;
    }

    tokio::select! {
        biased;
        _ = token.cancelled() => SleepOutcome::Cancelled,
        _ = sleep(duration) => SleepOutcome::Elapsed,
    }
}

/// Returns the current time as milliseconds since UNIX_EPOCH.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Returns the current time as seconds since UNIX_EPOCH.
pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
