//! BoardGameGeek XML API v2 collection document
//!
//! Numeric attributes are read as strings and parsed leniently: the API
//! sends empty strings for unset private values and "N/A" / "Not Ranked"
//! for missing ratings and ranks.

use bridge_traits::collection::{
    RemoteCollection, RemoteCollectionItem, RemotePrivateInfo, RemoteRank, RemoteStats,
    RemoteStatusFlags,
};
use serde::Deserialize;
use std::str::FromStr;

/// `<items totalitems="..">`
#[derive(Debug, Deserialize)]
pub struct ItemsXml {
    #[serde(rename = "@totalitems", default)]
    pub total_items: Option<String>,
    #[serde(rename = "item", default)]
    pub items: Vec<ItemXml>,
}

#[derive(Debug, Deserialize)]
pub struct ItemXml {
    #[serde(rename = "@objecttype", default)]
    pub object_type: String,
    #[serde(rename = "@objectid")]
    pub object_id: i64,
    #[serde(rename = "@subtype", default)]
    pub subtype: String,
    #[serde(rename = "@collid")]
    pub collection_id: i64,
    pub name: Option<NameXml>,
    #[serde(rename = "yearpublished")]
    pub year_published: Option<String>,
    pub image: Option<String>,
    pub thumbnail: Option<String>,
    pub stats: Option<StatsXml>,
    pub status: Option<StatusXml>,
    #[serde(rename = "numplays")]
    pub num_plays: Option<String>,
    #[serde(rename = "privateinfo")]
    pub private_info: Option<PrivateInfoXml>,
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NameXml {
    #[serde(rename = "@sortindex", default)]
    pub sort_index: Option<String>,
    #[serde(rename = "$text", default)]
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusXml {
    #[serde(rename = "@own", default)]
    pub own: String,
    #[serde(rename = "@prevowned", default)]
    pub previously_owned: String,
    #[serde(rename = "@fortrade", default)]
    pub for_trade: String,
    #[serde(rename = "@want", default)]
    pub want: String,
    #[serde(rename = "@wanttoplay", default)]
    pub want_to_play: String,
    #[serde(rename = "@wanttobuy", default)]
    pub want_to_buy: String,
    #[serde(rename = "@wishlist", default)]
    pub wishlist: String,
    #[serde(rename = "@wishlistpriority", default)]
    pub wishlist_priority: Option<String>,
    #[serde(rename = "@preordered", default)]
    pub preordered: String,
    #[serde(rename = "@lastmodified", default)]
    pub last_modified: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatsXml {
    #[serde(rename = "@minplayers", default)]
    pub min_players: Option<String>,
    #[serde(rename = "@maxplayers", default)]
    pub max_players: Option<String>,
    #[serde(rename = "@minplaytime", default)]
    pub min_playtime: Option<String>,
    #[serde(rename = "@maxplaytime", default)]
    pub max_playtime: Option<String>,
    #[serde(rename = "@playingtime", default)]
    pub playing_time: Option<String>,
    #[serde(rename = "@numowned", default)]
    pub num_owned: Option<String>,
    pub rating: Option<RatingXml>,
}

#[derive(Debug, Deserialize)]
pub struct RatingXml {
    #[serde(rename = "@value", default)]
    pub value: Option<String>,
    #[serde(rename = "usersrated")]
    pub users_rated: Option<ValueXml>,
    pub average: Option<ValueXml>,
    #[serde(rename = "bayesaverage")]
    pub bayes_average: Option<ValueXml>,
    pub ranks: Option<RanksXml>,
}

/// `<element value=".."/>`
#[derive(Debug, Deserialize)]
pub struct ValueXml {
    #[serde(rename = "@value", default)]
    pub value: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RanksXml {
    #[serde(rename = "rank", default)]
    pub ranks: Vec<RankXml>,
}

#[derive(Debug, Deserialize)]
pub struct RankXml {
    #[serde(rename = "@type", default)]
    pub rank_type: String,
    #[serde(rename = "@id", default)]
    pub id: Option<String>,
    #[serde(rename = "@name", default)]
    pub name: String,
    #[serde(rename = "@friendlyname", default)]
    pub friendly_name: String,
    #[serde(rename = "@value", default)]
    pub value: Option<String>,
    #[serde(rename = "@bayesaverage", default)]
    pub bayes_average: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PrivateInfoXml {
    #[serde(rename = "@pp_currency", default)]
    pub price_paid_currency: Option<String>,
    #[serde(rename = "@pricepaid", default)]
    pub price_paid: Option<String>,
    #[serde(rename = "@cv_currency", default)]
    pub current_value_currency: Option<String>,
    #[serde(rename = "@currvalue", default)]
    pub current_value: Option<String>,
    #[serde(rename = "@quantity", default)]
    pub quantity: Option<String>,
    #[serde(rename = "@acquisitiondate", default)]
    pub acquisition_date: Option<String>,
    #[serde(rename = "@acquiredfrom", default)]
    pub acquired_from: Option<String>,
    #[serde(rename = "@inventorylocation", default)]
    pub inventory_location: Option<String>,
    #[serde(rename = "privatecomment")]
    pub private_comment: Option<String>,
}

/// `<errors><error><message>..</message></error></errors>`
#[derive(Debug, Deserialize)]
pub struct ErrorsXml {
    #[serde(rename = "error", default)]
    pub errors: Vec<ErrorXml>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorXml {
    #[serde(default)]
    pub message: String,
}

fn parse_num<T: FromStr>(value: Option<&str>) -> Option<T> {
    value.map(str::trim).and_then(|v| v.parse().ok())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn flag(value: &str) -> bool {
    value.trim() == "1"
}

fn value_of(element: &Option<ValueXml>) -> Option<&str> {
    element.as_ref().and_then(|e| e.value.as_deref())
}

impl From<ItemsXml> for RemoteCollection {
    fn from(xml: ItemsXml) -> Self {
        let items: Vec<RemoteCollectionItem> = xml.items.into_iter().map(Into::into).collect();
        let total_items =
            parse_num(xml.total_items.as_deref()).unwrap_or(items.len() as u32);

        RemoteCollection { total_items, items }
    }
}

impl From<ItemXml> for RemoteCollectionItem {
    fn from(xml: ItemXml) -> Self {
        let (name, sort_index) = match xml.name {
            Some(name) => (
                name.value.trim().to_string(),
                parse_num(name.sort_index.as_deref()).unwrap_or(1),
            ),
            None => (String::new(), 1),
        };

        RemoteCollectionItem {
            collection_id: xml.collection_id,
            game_id: xml.object_id,
            object_type: xml.object_type,
            subtype: xml.subtype,
            name,
            sort_index,
            year_published: parse_num(xml.year_published.as_deref()).filter(|y: &i32| *y != 0),
            image_url: non_empty(xml.image),
            thumbnail_url: non_empty(xml.thumbnail),
            status: xml.status.map(Into::into).unwrap_or_default(),
            num_plays: parse_num(xml.num_plays.as_deref()).unwrap_or(0),
            comment: non_empty(xml.comment),
            private_info: xml.private_info.map(Into::into),
            stats: xml.stats.map(Into::into),
        }
    }
}

impl From<StatusXml> for RemoteStatusFlags {
    fn from(xml: StatusXml) -> Self {
        RemoteStatusFlags {
            own: flag(&xml.own),
            previously_owned: flag(&xml.previously_owned),
            for_trade: flag(&xml.for_trade),
            want: flag(&xml.want),
            want_to_play: flag(&xml.want_to_play),
            want_to_buy: flag(&xml.want_to_buy),
            wishlist: flag(&xml.wishlist),
            wishlist_priority: parse_num(xml.wishlist_priority.as_deref()),
            preordered: flag(&xml.preordered),
            last_modified: non_empty(xml.last_modified),
        }
    }
}

impl From<StatsXml> for RemoteStats {
    fn from(xml: StatsXml) -> Self {
        let rating = xml.rating;

        RemoteStats {
            min_players: parse_num(xml.min_players.as_deref()),
            max_players: parse_num(xml.max_players.as_deref()),
            min_playtime: parse_num(xml.min_playtime.as_deref()),
            max_playtime: parse_num(xml.max_playtime.as_deref()),
            playing_time: parse_num(xml.playing_time.as_deref()),
            num_owned: parse_num(xml.num_owned.as_deref()),
            rating: rating
                .as_ref()
                .and_then(|r| parse_num(r.value.as_deref())),
            users_rated: rating
                .as_ref()
                .and_then(|r| parse_num(value_of(&r.users_rated))),
            average: rating
                .as_ref()
                .and_then(|r| parse_num(value_of(&r.average))),
            bayes_average: rating
                .as_ref()
                .and_then(|r| parse_num(value_of(&r.bayes_average))),
            ranks: rating
                .and_then(|r| r.ranks)
                .map(|r| r.ranks.into_iter().map(Into::into).collect())
                .unwrap_or_default(),
        }
    }
}

impl From<RankXml> for RemoteRank {
    fn from(xml: RankXml) -> Self {
        RemoteRank {
            rank_type: xml.rank_type,
            id: parse_num(xml.id.as_deref()).unwrap_or(0),
            name: xml.name,
            friendly_name: xml.friendly_name,
            value: parse_num(xml.value.as_deref()),
            bayes_average: parse_num(xml.bayes_average.as_deref()),
        }
    }
}

impl From<PrivateInfoXml> for RemotePrivateInfo {
    fn from(xml: PrivateInfoXml) -> Self {
        RemotePrivateInfo {
            price_paid_currency: non_empty(xml.price_paid_currency),
            price_paid: parse_num(xml.price_paid.as_deref()),
            current_value_currency: non_empty(xml.current_value_currency),
            current_value: parse_num(xml.current_value.as_deref()),
            quantity: parse_num(xml.quantity.as_deref()),
            acquisition_date: non_empty(xml.acquisition_date),
            acquired_from: non_empty(xml.acquired_from),
            inventory_location: non_empty(xml.inventory_location),
            private_comment: non_empty(xml.private_comment),
        }
    }
}
