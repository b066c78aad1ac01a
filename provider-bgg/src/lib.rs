//! # BoardGameGeek Provider
//!
//! Implements `CollectionProvider` for the BoardGameGeek XML API v2
//! `collection` endpoint.
//!
//! ## Overview
//!
//! - Builds the partition query (`subtype`, status flags, `stats`,
//!   `showprivate`, `modifiedsince`) onto the configured base URL
//! - Retries `202 Accepted` while the server prepares the export, plus 429,
//!   through the host `HttpClient`; a 5xx is handed straight back
//! - Parses the `<items>` document into bridge collection types

pub mod connector;
pub mod error;
pub mod types;

pub use connector::BggCollectionConnector;
pub use error::{BggError, Result};
