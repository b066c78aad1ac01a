//! # Host Bridge Traits
//!
//! Capability traits the collection sync core needs from its host.
//!
//! ## Overview
//!
//! The core never talks to the network, the preferences file or the wall
//! clock directly. Each of those is a trait defined here and implemented per
//! platform (`bridge-desktop` on desktop, test doubles in unit tests).
//!
//! ## Traits
//!
//! ### Networking
//! - [`HttpClient`](http::HttpClient) - async HTTP with retry policy support
//! - [`CollectionProvider`](collection::CollectionProvider) - fetches one
//!   partition of a user's remote game collection
//!
//! ### Storage
//! - [`SettingsStore`](storage::SettingsStore) - durable key-value preferences,
//!   used for sync timestamps
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - forward structured logs to host logging
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! convert platform errors into it and keep messages actionable.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so they can be shared across async
//! tasks behind an `Arc`.

pub mod collection;
pub mod error;
pub mod http;
pub mod storage;
pub mod time;

pub use error::BridgeError;

pub use collection::{
    CollectionFetch, CollectionProvider, CollectionRequest, RemoteCollection,
    RemoteCollectionItem, RemotePrivateInfo, RemoteRank, RemoteStats, RemoteStatusFlags,
};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use storage::{SettingsStore, SettingsTransaction};
pub use time::{Clock, LogEntry, LogLevel, LoggerSink, ManualClock, SystemClock};
