//! # Collection Persister
//!
//! Maps fetched items onto library rows and writes them, stamping every row
//! with the persister's current write timestamp.

use bridge_traits::collection::{RemoteCollectionItem, RemoteRank};
use bridge_traits::time::Clock;
use core_library::models::{CollectionItem, GameRank};
use core_library::repositories::{CollectionRepository, GameRankRepository, UpsertOptions};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::Result;

pub struct CollectionPersister {
    collection_repository: Arc<dyn CollectionRepository>,
    rank_repository: Arc<dyn GameRankRepository>,
    clock: Arc<dyn Clock>,
    options: UpsertOptions,
    timestamp: AtomicI64,
}

/// Builder for [`CollectionPersister`]; stats and private info are off
/// unless requested.
pub struct CollectionPersisterBuilder {
    collection_repository: Arc<dyn CollectionRepository>,
    rank_repository: Arc<dyn GameRankRepository>,
    clock: Arc<dyn Clock>,
    options: UpsertOptions,
}

impl CollectionPersisterBuilder {
    pub fn include_stats(mut self) -> Self {
        self.options.stats = true;
        self
    }

    pub fn include_private_info(mut self) -> Self {
        self.options.private_info = true;
        self
    }

    pub fn build(self) -> CollectionPersister {
        let now = self.clock.unix_timestamp_millis();
        CollectionPersister {
            collection_repository: self.collection_repository,
            rank_repository: self.rank_repository,
            clock: self.clock,
            options: self.options,
            timestamp: AtomicI64::new(now),
        }
    }
}

impl CollectionPersister {
    pub fn builder(
        collection_repository: Arc<dyn CollectionRepository>,
        rank_repository: Arc<dyn GameRankRepository>,
        clock: Arc<dyn Clock>,
    ) -> CollectionPersisterBuilder {
        CollectionPersisterBuilder {
            collection_repository,
            rank_repository,
            clock,
            options: UpsertOptions::default(),
        }
    }

    /// Capture the clock's now as the write timestamp for following saves.
    pub fn reset_timestamp(&self) {
        self.timestamp
            .store(self.clock.unix_timestamp_millis(), Ordering::SeqCst);
    }

    /// Pin the write timestamp to `timestamp`.
    pub fn reset_timestamp_to(&self, timestamp: i64) {
        self.timestamp.store(timestamp, Ordering::SeqCst);
    }

    /// Timestamp stamped on rows by the last (or next) save.
    pub fn timestamp(&self) -> i64 {
        self.timestamp.load(Ordering::SeqCst)
    }

    pub fn options(&self) -> UpsertOptions {
        self.options
    }

    /// Upsert `items` by collection id.
    ///
    /// Items that do not map onto a valid row (missing name, non-positive
    /// ids) are logged and left out; the rest of the batch is still written.
    ///
    /// # Returns
    /// Number of collection rows written
    pub async fn save(&self, items: &[RemoteCollectionItem]) -> Result<u64> {
        let timestamp = self.timestamp();
        let mut rows = Vec::with_capacity(items.len());
        let mut accepted = Vec::with_capacity(items.len());

        for item in items {
            let row = to_collection_item(item, timestamp, self.options);
            match row.validate() {
                Ok(()) => {
                    rows.push(row);
                    accepted.push(item);
                }
                Err(reason) => warn!(
                    collection_id = item.collection_id,
                    game_id = item.game_id,
                    "Skipping invalid collection item: {}",
                    reason
                ),
            }
        }

        let written = self
            .collection_repository
            .upsert_batch(&rows, self.options)
            .await?;

        if self.options.stats {
            let ranks = ranks_by_game(accepted);
            if !ranks.is_empty() {
                self.rank_repository.replace_for_games(&ranks).await?;
            }
        }

        debug!(
            written,
            skipped = items.len() - rows.len(),
            timestamp,
            "Saved collection items"
        );
        Ok(written)
    }
}

fn to_collection_item(
    item: &RemoteCollectionItem,
    timestamp: i64,
    options: UpsertOptions,
) -> CollectionItem {
    let mut row = CollectionItem::new(
        item.collection_id,
        item.game_id,
        item.subtype.clone(),
        item.name.clone(),
    );

    row.sort_index = item.sort_index;
    row.year_published = item.year_published;
    row.image_url = item.image_url.clone();
    row.thumbnail_url = item.thumbnail_url.clone();
    row.own = item.status.own;
    row.previously_owned = item.status.previously_owned;
    row.for_trade = item.status.for_trade;
    row.want = item.status.want;
    row.want_to_play = item.status.want_to_play;
    row.want_to_buy = item.status.want_to_buy;
    row.wishlist = item.status.wishlist;
    row.wishlist_priority = item.status.wishlist_priority.filter(|p| (1..=5).contains(p));
    row.preordered = item.status.preordered;
    row.last_modified = item.status.last_modified.clone();
    row.num_plays = item.num_plays.max(0);
    row.comment = item.comment.clone();
    row.updated_list = timestamp;

    if options.stats {
        if let Some(stats) = &item.stats {
            row.rating = stats.rating;
            row.min_players = stats.min_players;
            row.max_players = stats.max_players;
            row.min_playtime = stats.min_playtime;
            row.max_playtime = stats.max_playtime;
            row.playing_time = stats.playing_time;
            row.num_owned = stats.num_owned;
            row.users_rated = stats.users_rated;
            row.average = stats.average;
            row.bayes_average = stats.bayes_average;
        }
    }

    if options.private_info {
        if let Some(private) = &item.private_info {
            row.price_paid_currency = private.price_paid_currency.clone();
            row.price_paid = private.price_paid;
            row.current_value_currency = private.current_value_currency.clone();
            row.current_value = private.current_value;
            row.quantity = private.quantity;
            row.acquisition_date = private.acquisition_date.clone();
            row.acquired_from = private.acquired_from.clone();
            row.inventory_location = private.inventory_location.clone();
            row.private_comment = private.private_comment.clone();
        }
    }

    row
}

/// One rank set per game; for a game listed twice the later entry wins.
fn ranks_by_game<'a>(
    items: impl IntoIterator<Item = &'a RemoteCollectionItem>,
) -> Vec<(i64, Vec<GameRank>)> {
    let mut by_game: BTreeMap<i64, Vec<GameRank>> = BTreeMap::new();

    for item in items {
        let Some(stats) = &item.stats else {
            continue;
        };
        let ranks = stats
            .ranks
            .iter()
            .filter(|rank| !rank.name.trim().is_empty())
            .map(|rank| to_game_rank(item.game_id, rank))
            .collect();
        by_game.insert(item.game_id, ranks);
    }

    by_game.into_iter().collect()
}

fn to_game_rank(game_id: i64, rank: &RemoteRank) -> GameRank {
    GameRank {
        game_id,
        rank_id: rank.id,
        rank_type: rank.rank_type.clone(),
        name: rank.name.clone(),
        friendly_name: rank.friendly_name.clone(),
        value: rank.value.filter(|v| *v > 0),
        bayes_average: rank.bayes_average,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::collection::{RemotePrivateInfo, RemoteStats, RemoteStatusFlags};
    use bridge_traits::time::ManualClock;
    use core_library::create_test_pool;
    use core_library::repositories::{SqliteCollectionRepository, SqliteGameRankRepository};

    fn remote_item(collection_id: i64, game_id: i64) -> RemoteCollectionItem {
        RemoteCollectionItem {
            collection_id,
            game_id,
            object_type: "thing".to_string(),
            subtype: "boardgame".to_string(),
            name: format!("Game {}", game_id),
            sort_index: 1,
            status: RemoteStatusFlags {
                own: true,
                ..RemoteStatusFlags::default()
            },
            num_plays: 2,
            stats: Some(RemoteStats {
                rating: Some(8.0),
                average: Some(7.2),
                ranks: vec![RemoteRank {
                    rank_type: "subtype".to_string(),
                    id: 1,
                    name: "boardgame".to_string(),
                    friendly_name: "Board Game Rank".to_string(),
                    value: Some(100),
                    bayes_average: Some(7.0),
                }],
                ..RemoteStats::default()
            }),
            private_info: Some(RemotePrivateInfo {
                price_paid: Some(30.0),
                ..RemotePrivateInfo::default()
            }),
            ..RemoteCollectionItem::default()
        }
    }

    struct Fixture {
        collection: Arc<SqliteCollectionRepository>,
        ranks: Arc<SqliteGameRankRepository>,
        clock: Arc<ManualClock>,
    }

    async fn fixture() -> Fixture {
        let pool = create_test_pool().await.unwrap();
        Fixture {
            collection: Arc::new(SqliteCollectionRepository::new(pool.clone())),
            ranks: Arc::new(SqliteGameRankRepository::new(pool)),
            clock: Arc::new(ManualClock::new(1_000)),
        }
    }

    impl Fixture {
        fn builder(&self) -> CollectionPersisterBuilder {
            CollectionPersister::builder(
                self.collection.clone(),
                self.ranks.clone(),
                self.clock.clone(),
            )
        }
    }

    #[core_async::test]
    async fn test_timestamp_reset_and_pin() {
        let f = fixture().await;
        let persister = f.builder().build();
        assert_eq!(persister.timestamp(), 1_000);

        f.clock.advance_millis(500);
        persister.reset_timestamp();
        assert_eq!(persister.timestamp(), 1_500);

        persister.reset_timestamp_to(42);
        assert_eq!(persister.timestamp(), 42);
    }

    #[core_async::test]
    async fn test_save_stamps_rows_and_writes_all_groups() {
        let f = fixture().await;
        let persister = f.builder().include_stats().include_private_info().build();
        persister.reset_timestamp_to(777);

        let written = persister
            .save(&[remote_item(1, 13), remote_item(2, 822)])
            .await
            .unwrap();

        assert_eq!(written, 2);
        let row = f.collection.find_by_collection_id(1).await.unwrap().unwrap();
        assert_eq!(row.updated_list, 777);
        assert!(row.own);
        assert_eq!(row.rating, Some(8.0));
        assert_eq!(row.price_paid, Some(30.0));
        assert_eq!(f.ranks.find_by_game(13).await.unwrap().len(), 1);
    }

    #[core_async::test]
    async fn test_save_without_stats_skips_stats_private_and_ranks() {
        let f = fixture().await;
        let persister = f.builder().build();

        persister.save(&[remote_item(1, 13)]).await.unwrap();

        let row = f.collection.find_by_collection_id(1).await.unwrap().unwrap();
        assert_eq!(row.rating, None);
        assert_eq!(row.price_paid, None);
        assert_eq!(f.ranks.count().await.unwrap(), 0);
    }

    #[core_async::test]
    async fn test_saving_twice_does_not_duplicate() {
        let f = fixture().await;
        let persister = f.builder().include_stats().build();

        persister.save(&[remote_item(1, 13)]).await.unwrap();
        persister.save(&[remote_item(1, 13)]).await.unwrap();

        assert_eq!(f.collection.count().await.unwrap(), 1);
        assert_eq!(f.ranks.count().await.unwrap(), 1);
    }

    #[core_async::test]
    async fn test_invalid_items_are_skipped_and_rest_saved() {
        let f = fixture().await;
        let persister = f.builder().include_stats().build();

        let mut nameless = remote_item(2, 822);
        nameless.name = String::new();
        let mut no_game = remote_item(3, 0);
        no_game.name = "Orphan".to_string();

        let written = persister
            .save(&[remote_item(1, 13), nameless, no_game])
            .await
            .unwrap();

        assert_eq!(written, 1);
        assert_eq!(f.collection.count().await.unwrap(), 1);
        assert!(f.collection.find_by_collection_id(2).await.unwrap().is_none());
        assert!(f.ranks.find_by_game(822).await.unwrap().is_empty());
        assert_eq!(f.ranks.find_by_game(13).await.unwrap().len(), 1);
    }

    #[core_async::test]
    async fn test_batch_of_only_invalid_items_writes_nothing() {
        let f = fixture().await;
        let persister = f.builder().build();

        let mut nameless = remote_item(1, 13);
        nameless.name = "  ".to_string();

        assert_eq!(persister.save(&[nameless]).await.unwrap(), 0);
        assert_eq!(f.collection.count().await.unwrap(), 0);
    }

    #[test]
    fn test_ranks_by_game_last_entry_wins() {
        let mut first = remote_item(1, 13);
        let mut second = remote_item(2, 13);
        if let Some(stats) = first.stats.as_mut() {
            stats.ranks[0].value = Some(10);
        }
        if let Some(stats) = second.stats.as_mut() {
            stats.ranks[0].value = Some(20);
        }

        let ranks = ranks_by_game(&[first, second, remote_item(3, 5)]);
        assert_eq!(ranks.len(), 2);
        assert_eq!(ranks[0].0, 5);
        assert_eq!(ranks[1].1[0].value, Some(20));
    }
}
