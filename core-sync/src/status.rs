//! # Status Catalog
//!
//! Collection statuses the remote service understands, their display labels,
//! and the item subtypes each status is fetched in.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status the server returns regardless of exclusion flags.
pub const PLAYED: &str = "played";

const STATUS_VALUES: &[&str] = &[
    "own",
    "prevowned",
    "trade",
    "want",
    "wanttoplay",
    "wanttobuy",
    "wishlist",
    "preordered",
    "played",
    "rated",
    "comment",
];

const STATUS_LABELS: &[&str] = &[
    "Owned",
    "Previously Owned",
    "For Trade",
    "Want In Trade",
    "Want To Play",
    "Want To Buy",
    "Wishlist",
    "Preordered",
    "Played",
    "Rated",
    "Commented",
];

/// Parallel value/label tables.
#[derive(Debug, Clone)]
pub struct StatusCatalog {
    values: Vec<String>,
    labels: Vec<String>,
}

impl StatusCatalog {
    /// Custom tables; extra entries on the longer side are ignored.
    pub fn new(values: Vec<String>, labels: Vec<String>) -> Self {
        let len = values.len().min(labels.len());
        let mut values = values;
        let mut labels = labels;
        values.truncate(len);
        labels.truncate(len);
        Self { values, labels }
    }

    /// Display label for `status`, or the raw value when it is unknown.
    pub fn describe(&self, status: &str) -> String {
        self.values
            .iter()
            .position(|value| value.eq_ignore_ascii_case(status))
            .map(|idx| self.labels[idx].clone())
            .unwrap_or_else(|| status.to_string())
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn is_known(&self, status: &str) -> bool {
        self.values.iter().any(|v| v.eq_ignore_ascii_case(status))
    }
}

impl Default for StatusCatalog {
    fn default() -> Self {
        Self::new(
            STATUS_VALUES.iter().map(|s| s.to_string()).collect(),
            STATUS_LABELS.iter().map(|s| s.to_string()).collect(),
        )
    }
}

/// Sync order: blanks and repeats dropped, names lowercased, `played` moved
/// to the front, everything else in its original relative order.
pub fn order_statuses<S: AsRef<str>>(statuses: &[S]) -> Vec<String> {
    let mut ordered: Vec<String> = Vec::with_capacity(statuses.len());
    for status in statuses.iter().filter_map(|s| normalize_status(s.as_ref())) {
        if !ordered.contains(&status) {
            ordered.push(status);
        }
    }

    if let Some(idx) = ordered.iter().position(|s| s == PLAYED) {
        let played = ordered.remove(idx);
        ordered.insert(0, played);
    }

    ordered
}

/// Statuses from a comma separated preference value.
pub fn parse_status_list(value: &str) -> Vec<String> {
    value.split(',').filter_map(normalize_status).collect()
}

/// Trimmed, lowercased status name; `None` when blank.
pub fn normalize_status(status: &str) -> Option<String> {
    let status = status.trim();
    (!status.is_empty()).then(|| status.to_ascii_lowercase())
}

/// Item kind partition of a status fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollectionSubtype {
    /// No `subtype` parameter; the server default (board games and expansions)
    Unspecified,
    BoardGame,
    Expansion,
    Accessory,
}

impl CollectionSubtype {
    /// Value of the `subtype` query parameter; empty for the server default.
    pub fn as_param(&self) -> &'static str {
        match self {
            CollectionSubtype::Unspecified => "",
            CollectionSubtype::BoardGame => "boardgame",
            CollectionSubtype::Expansion => "boardgameexpansion",
            CollectionSubtype::Accessory => "boardgameaccessory",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            CollectionSubtype::Unspecified => "items",
            CollectionSubtype::BoardGame => "games",
            CollectionSubtype::Expansion => "expansions",
            CollectionSubtype::Accessory => "accessories",
        }
    }

    /// Segment used in preference keys.
    pub fn key_segment(&self) -> &'static str {
        match self {
            CollectionSubtype::Unspecified => "all",
            other => other.as_param(),
        }
    }
}

impl fmt::Display for CollectionSubtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}
