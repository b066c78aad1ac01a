//! Domain models for the local collection
//!
//! Rows map 1:1 onto the `collection` and `game_ranks` tables.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// =============================================================================
// Collection
// =============================================================================

/// One entry of a user's collection.
///
/// `collection_id` is the remote collection id and the primary key; a game
/// owned twice shows up as two entries with the same `game_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CollectionItem {
    pub collection_id: i64,
    pub game_id: i64,
    /// `boardgame`, `boardgameexpansion` or `boardgameaccessory`
    pub subtype: String,
    pub name: String,
    /// Number of leading characters ignored when sorting by name ("The ")
    pub sort_index: i32,
    pub year_published: Option<i32>,
    pub image_url: Option<String>,
    pub thumbnail_url: Option<String>,

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
    pub num_plays: i32,
    pub comment: Option<String>,

    pub rating: Option<f64>,
    pub min_players: Option<i32>,
    pub max_players: Option<i32>,
    pub min_playtime: Option<i32>,
    pub max_playtime: Option<i32>,
    pub playing_time: Option<i32>,
    pub num_owned: Option<i32>,
    pub users_rated: Option<i32>,
    pub average: Option<f64>,
    pub bayes_average: Option<f64>,

    pub price_paid_currency: Option<String>,
    pub price_paid: Option<f64>,
    pub current_value_currency: Option<String>,
    pub current_value: Option<f64>,
    pub quantity: Option<i32>,
    pub acquisition_date: Option<String>,
    pub acquired_from: Option<String>,
    pub inventory_location: Option<String>,
    pub private_comment: Option<String>,

    /// Millis timestamp of the sync run that last wrote this row
    pub updated_list: i64,
}

impl CollectionItem {
    /// Minimal item with every optional column empty.
    pub fn new(
        collection_id: i64,
        game_id: i64,
        subtype: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            collection_id,
            game_id,
            subtype: subtype.into(),
            name: name.into(),
            sort_index: 1,
            year_published: None,
            image_url: None,
            thumbnail_url: None,
            own: false,
            previously_owned: false,
            for_trade: false,
            want: false,
            want_to_play: false,
            want_to_buy: false,
            wishlist: false,
            wishlist_priority: None,
            preordered: false,
            last_modified: None,
            num_plays: 0,
            comment: None,
            rating: None,
            min_players: None,
            max_players: None,
            min_playtime: None,
            max_playtime: None,
            playing_time: None,
            num_owned: None,
            users_rated: None,
            average: None,
            bayes_average: None,
            price_paid_currency: None,
            price_paid: None,
            current_value_currency: None,
            current_value: None,
            quantity: None,
            acquisition_date: None,
            acquired_from: None,
            inventory_location: None,
            private_comment: None,
            updated_list: 0,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.collection_id <= 0 {
            return Err("Collection id must be positive".to_string());
        }

        if self.game_id <= 0 {
            return Err("Game id must be positive".to_string());
        }

        if self.name.trim().is_empty() {
            return Err("Item name cannot be empty".to_string());
        }

        if self.subtype.trim().is_empty() {
            return Err("Item subtype cannot be empty".to_string());
        }

        if self.num_plays < 0 {
            return Err("Play count cannot be negative".to_string());
        }

        if let Some(priority) = self.wishlist_priority {
            if !(1..=5).contains(&priority) {
                return Err(format!("Wishlist priority {} is out of range", priority));
            }
        }

        if self.updated_list < 0 {
            return Err("Update timestamp cannot be negative".to_string());
        }

        Ok(())
    }

    /// Name with the leading article skipped, as used for sorting.
    pub fn sort_name(&self) -> &str {
        let skip = (self.sort_index.max(1) - 1) as usize;
        self.name
            .char_indices()
            .nth(skip)
            .map(|(idx, _)| &self.name[idx..])
            .unwrap_or(&self.name)
    }
}

// =============================================================================
// Ranks
// =============================================================================

/// A game's position in one ranking (overall, or a family such as
/// "strategygames").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct GameRank {
    pub game_id: i64,
    pub rank_id: i64,
    /// `subtype` or `family`
    pub rank_type: String,
    pub name: String,
    pub friendly_name: String,
    /// `None` when the game is not ranked in this list
    pub value: Option<i32>,
    pub bayes_average: Option<f64>,
}

impl GameRank {
    pub fn validate(&self) -> Result<(), String> {
        if self.game_id <= 0 {
            return Err("Game id must be positive".to_string());
        }

        if self.name.trim().is_empty() {
            return Err("Rank name cannot be empty".to_string());
        }

        if let Some(value) = self.value {
            if value <= 0 {
                return Err(format!("Rank value {} must be positive", value));
            }
        }

        Ok(())
    }
}
