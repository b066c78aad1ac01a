//! # Event Bus System
//!
//! Side channel between the sync engine and whoever presents its progress.
//! Events are fire-and-forget: emitting with no subscribers is not a failure
//! the engine cares about, and a slow subscriber only ever lags itself.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐    emit     ┌────────────┐   subscribe   ┌────────────┐
//! │ Collection   ├────────────>│  EventBus  ├──────────────>│ UI / host  │
//! │ sync runs    │             │ (broadcast)│               │ notifier   │
//! └──────────────┘             └────────────┘               └────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, SyncEvent};
//!
//! let bus = EventBus::new(64);
//! let mut subscriber = bus.subscribe();
//!
//! bus.emit(CoreEvent::Sync(SyncEvent::Progress {
//!     run_id: "run-1".to_string(),
//!     message: "Downloading 'Owned' items".to_string(),
//! }))
//! .ok();
//!
//! assert!(subscriber.try_recv().is_ok());
//! ```

use core_async::sync::broadcast::{self, error::RecvError, error::SendError, Receiver};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default per-subscriber buffer.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 256;

/// Top-level event published on the bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    Sync(SyncEvent),
    Collection(CollectionEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Sync(e) => e.description(),
            CoreEvent::Collection(e) => e.description(),
        }
    }

    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Sync(SyncEvent::PartitionFailed { .. }) => EventSeverity::Error,
            CoreEvent::Sync(SyncEvent::Cancelled { io_errors, .. }) if *io_errors > 0 => {
                EventSeverity::Warning
            }
            CoreEvent::Sync(SyncEvent::Completed { .. }) => EventSeverity::Info,
            CoreEvent::Collection(CollectionEvent::Cleared { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

/// Lifecycle of a collection sync run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event")]
pub enum SyncEvent {
    Started {
        run_id: String,
        /// "complete" or "modified_since"
        kind: String,
    },
    /// Human-readable progress line, e.g. "Saving 12 'Owned' accessories".
    Progress { run_id: String, message: String },
    /// A partition fetch failed; the run is being cancelled.
    PartitionFailed {
        run_id: String,
        /// Partition label, e.g. "'Owned' games"
        detail: String,
        /// HTTP status for remote errors, `None` for transport errors
        status_code: Option<u16>,
        message: String,
    },
    Completed {
        run_id: String,
        items_updated: u64,
        items_deleted: u64,
        duration_secs: u64,
    },
    /// Run stopped early: external cancellation or a partition failure.
    Cancelled {
        run_id: String,
        items_updated: u64,
        io_errors: u64,
    },
    /// Run did nothing (sync disabled, recently completed, ...).
    Skipped { run_id: String, reason: String },
}

impl SyncEvent {
    fn description(&self) -> &str {
        match self {
            SyncEvent::Started { .. } => "Collection sync started",
            SyncEvent::Progress { .. } => "Collection sync in progress",
            SyncEvent::PartitionFailed { .. } => "Collection sync request failed",
            SyncEvent::Completed { .. } => "Collection sync completed",
            SyncEvent::Cancelled { .. } => "Collection sync cancelled",
            SyncEvent::Skipped { .. } => "Collection sync skipped",
        }
    }
}

/// Changes to the local collection store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event")]
pub enum CollectionEvent {
    ItemsSaved {
        status: String,
        subtype: String,
        count: u64,
    },
    StaleItemsDeleted { count: u64 },
    Cleared { items_removed: u64, ranks_removed: u64 },
}

impl CollectionEvent {
    fn description(&self) -> &str {
        match self {
            CollectionEvent::ItemsSaved { .. } => "Collection items saved",
            CollectionEvent::StaleItemsDeleted { .. } => "Stale collection items deleted",
            CollectionEvent::Cleared { .. } => "Local collection cleared",
        }
    }
}

/// Broadcast bus for [`CoreEvent`]s.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus.
    ///
    /// A subscriber that falls more than `capacity` events behind receives
    /// `RecvError::Lagged` on its next receive.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers reached, or an error when there are
    /// none. Producers normally discard the result with `.ok()`.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// New receiver for all future events. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A `broadcast::Receiver` with an optional filter.
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus, EventSeverity, EventStream};
///
/// let bus = EventBus::default();
/// let errors = EventStream::new(bus.subscribe())
///     .filter(|event| event.severity() >= EventSeverity::Warning);
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events matching `predicate` are returned by `recv`/`try_recv`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn matches(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter.
    ///
    /// # Errors
    ///
    /// `RecvError::Lagged(n)` if this subscriber fell behind by `n` events,
    /// `RecvError::Closed` once every sender is gone.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.matches(&event) {
                return Ok(event);
            }
        }
    }

    /// Non-blocking receive; `None` when nothing matching is queued.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.matches(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }

    /// Drains every queued matching event.
    pub fn drain(&mut self) -> Vec<CoreEvent> {
        let mut events = Vec::new();
        while let Some(Ok(event)) = self.try_recv() {
            events.push(event);
        }
        events
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}
