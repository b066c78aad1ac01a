//! # Core Runtime Module
//!
//! Runtime infrastructure shared by the collection sync crates:
//! - logging and tracing bootstrap
//! - configuration (`CoreConfig`, `CollectionSyncConfig`)
//! - the event bus that carries sync progress and errors to the host

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{CollectionSyncConfig, CoreConfig, CoreConfigBuilder};
pub use error::{Error, Result};
pub use events::{CollectionEvent, CoreEvent, EventBus, EventSeverity, EventStream, SyncEvent};
