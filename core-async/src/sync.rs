//! Synchronization primitives.
//!
//! `CancellationToken` is the cooperative cancellation signal shared between
//! a running sync and whoever asked for it to stop.

pub use tokio::sync::{
    broadcast, mpsc, oneshot, watch, Mutex, MutexGuard, Notify, RwLock, RwLockReadGuard,
    RwLockWriteGuard, Semaphore,
};

pub use tokio_util::sync::{CancellationToken, DropGuard, WaitForCancellationFuture};
