//! Async runtime facade for the collection sync workspace.
//!
//! Every other crate in the workspace depends on this crate instead of
//! reaching for tokio directly. It re-exports the task, time and sync
//! primitives the sync engine needs and adds the one primitive tokio does not
//! ship: a sleep that ends early when a [`sync::CancellationToken`] fires.
//!
//! # Modules
//!
//! - `task`: task spawning
//! - `time`: sleep, timeouts and the interruptible pause
//! - `sync`: locks, channels and cancellation tokens
//! - `runtime`: blocking entry points used by `#[core_async::test]`
//!
//! # Examples
//!
//! ```rust
//! use core_async::sync::CancellationToken;
//! use core_async::time::{sleep_or_cancelled, Duration, SleepOutcome};
//!
//! async fn pause_between_requests(token: &CancellationToken) -> bool {
//!     sleep_or_cancelled(Duration::from_secs(5), token).await == SleepOutcome::Elapsed
//! }
//! ```

// Entry-point/test macros so downstream crates never need tokio's.
pub use core_async_macros::{main, test};

pub mod runtime;
pub mod sync;
pub mod task;
pub mod time;

pub use task::spawn;
pub use time::{sleep, Duration, Instant};
