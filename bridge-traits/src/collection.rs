//! Remote Collection Fetcher
//!
//! One call to [`CollectionProvider::fetch_collection`] fetches one partition
//! of a user's collection: a single status, optionally a single subtype, with
//! every status handled earlier in the run explicitly switched off.
//!
//! The remote API returns the union of all statuses that are not mentioned in
//! the query, which is why the request carries both `<status>=1` and
//! `<status>=0` flags.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;

/// Format the collection endpoint expects for `modifiedsince`.
pub const MODIFIED_SINCE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Query for one collection partition.
///
/// Parameters keep insertion order. Setting a key twice replaces the earlier
/// value, so a status can never be both included and excluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionRequest {
    pub username: String,
    params: Vec<(String, String)>,
}

impl CollectionRequest {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            params: Vec::new(),
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.params.iter_mut().find(|(k, _)| *k == key) {
            Some(existing) => existing.1 = value,
            None => self.params.push((key, value)),
        }
        self
    }

    /// Restrict to one subtype; an empty subtype leaves the server default.
    pub fn subtype(self, subtype: &str) -> Self {
        if subtype.is_empty() {
            self
        } else {
            self.param("subtype", subtype)
        }
    }

    pub fn stats(self) -> Self {
        self.param("stats", "1")
    }

    pub fn show_private(self) -> Self {
        self.param("showprivate", "1")
    }

    pub fn include_status(self, status: &str) -> Self {
        self.param(status, "1")
    }

    pub fn exclude_status(self, status: &str) -> Self {
        self.param(status, "0")
    }

    pub fn modified_since(self, since: DateTime<Utc>) -> Self {
        let formatted = since.format(MODIFIED_SINCE_FORMAT).to_string();
        self.param("modifiedsince", formatted)
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Outcome of one fetch that reached the server.
///
/// Transport failures are reported through the `Err` side of
/// [`CollectionProvider::fetch_collection`]; a response with any status code
/// ends up here and only a 200 carries a parsed body.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionFetch {
    pub status_code: u16,
    pub collection: Option<RemoteCollection>,
}

impl CollectionFetch {
    pub fn ok(collection: RemoteCollection) -> Self {
        Self {
            status_code: 200,
            collection: Some(collection),
        }
    }

    pub fn status(status_code: u16) -> Self {
        Self {
            status_code,
            collection: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteCollection {
    pub total_items: u32,
    pub items: Vec<RemoteCollectionItem>,
}

/// One collection entry: a game plus the user's relationship to it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteCollectionItem {
    pub collection_id: i64,
    pub game_id: i64,
    pub object_type: String,
    pub subtype: String,
    pub name: String,
    pub sort_index: i32,
    pub year_published: Option<i32>,
    pub image_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub status: RemoteStatusFlags,
    pub num_plays: i32,
    pub comment: Option<String>,
    pub private_info: Option<RemotePrivateInfo>,
    pub stats: Option<RemoteStats>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteStatusFlags {
    pub own: bool,
    pub previously_owned: bool,
    pub for_trade: bool,
    pub want: bool,
    pub want_to_play: bool,
    pub want_to_buy: bool,
    pub wishlist: bool,
    pub wishlist_priority: Option<i32>,
    pub preordered: bool,
    pub last_modified: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemotePrivateInfo {
    pub price_paid_currency: Option<String>,
    pub price_paid: Option<f64>,
    pub current_value_currency: Option<String>,
    pub current_value: Option<f64>,
    pub quantity: Option<i32>,
    pub acquisition_date: Option<String>,
    pub acquired_from: Option<String>,
    pub inventory_location: Option<String>,
    pub private_comment: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteStats {
    pub min_players: Option<i32>,
    pub max_players: Option<i32>,
    pub min_playtime: Option<i32>,
    pub max_playtime: Option<i32>,
    pub playing_time: Option<i32>,
    pub num_owned: Option<i32>,
    /// The user's own rating; `None` when unrated
    pub rating: Option<f64>,
    pub users_rated: Option<i32>,
    pub average: Option<f64>,
    pub bayes_average: Option<f64>,
    pub ranks: Vec<RemoteRank>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteRank {
    pub rank_type: String,
    pub id: i64,
    pub name: String,
    pub friendly_name: String,
    /// `None` when the game is "Not Ranked"
    pub value: Option<i32>,
    pub bayes_average: Option<f64>,
}

/// Fetches collection partitions from the remote service.
///
/// Implementations block until the response arrives; the sync engine never
/// has more than one request in flight.
#[async_trait]
pub trait CollectionProvider: Send + Sync {
    /// # Errors
    ///
    /// Returns an error only for transport failures (network, timeout,
    /// unreadable body). Non-200 statuses come back as `Ok` with
    /// [`CollectionFetch::collection`] set to `None`.
    async fn fetch_collection(&self, request: &CollectionRequest) -> Result<CollectionFetch>;
}
