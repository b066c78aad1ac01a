//! Collection repository trait and implementation

use crate::error::{LibraryError, Result};
use crate::models::CollectionItem;
use crate::repositories::{Page, PageRequest};
use async_trait::async_trait;
use sqlx::query::Query;
use sqlx::sqlite::SqliteArguments;
use sqlx::{query_as, Sqlite, SqlitePool};
use tracing::debug;

/// Columns written on every upsert, in bind order.
const BASE_COLUMNS: &[&str] = &[
    "game_id",
    "subtype",
    "name",
    "sort_index",
    "year_published",
    "image_url",
    "thumbnail_url",
    "own",
    "previously_owned",
    "for_trade",
    "want",
    "want_to_play",
    "want_to_buy",
    "wishlist",
    "wishlist_priority",
    "preordered",
    "last_modified",
    "num_plays",
    "comment",
    "updated_list",
];

const STATS_COLUMNS: &[&str] = &[
    "rating",
    "min_players",
    "max_players",
    "min_playtime",
    "max_playtime",
    "playing_time",
    "num_owned",
    "users_rated",
    "average",
    "bayes_average",
];

const PRIVATE_COLUMNS: &[&str] = &[
    "price_paid_currency",
    "price_paid",
    "current_value_currency",
    "current_value",
    "quantity",
    "acquisition_date",
    "acquired_from",
    "inventory_location",
    "private_comment",
];

/// Which optional column groups an upsert owns.
///
/// A request made without stats returns no stats, so writing those columns
/// would blank values fetched by an earlier request. Disabled groups are left
/// untouched on existing rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertOptions {
    pub stats: bool,
    pub private_info: bool,
}

impl UpsertOptions {
    pub fn all() -> Self {
        Self {
            stats: true,
            private_info: true,
        }
    }
}

/// Collection repository interface
#[async_trait]
pub trait CollectionRepository: Send + Sync {
    /// Insert or update items by collection id, in one transaction.
    ///
    /// # Returns
    /// Number of rows written
    ///
    /// # Errors
    /// Fails without writing anything if any item fails validation.
    async fn upsert_batch(&self, items: &[CollectionItem], options: UpsertOptions) -> Result<u64>;

    async fn find_by_collection_id(&self, collection_id: i64) -> Result<Option<CollectionItem>>;

    /// All entries for one game (a game can be in the collection twice).
    async fn find_by_game(&self, game_id: i64) -> Result<Vec<CollectionItem>>;

    /// Entries ordered by sort name.
    async fn query(&self, page_request: PageRequest) -> Result<Page<CollectionItem>>;

    async fn count(&self) -> Result<i64>;

    /// Delete every row whose `updated_list` is strictly older than
    /// `timestamp`.
    ///
    /// # Returns
    /// Number of rows deleted
    async fn delete_updated_before(&self, timestamp: i64) -> Result<u64>;

    /// Delete every row.
    async fn delete_all(&self) -> Result<u64>;
}

/// SQLite implementation of CollectionRepository
pub struct SqliteCollectionRepository {
    pool: SqlitePool,
}

impl SqliteCollectionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn columns(options: UpsertOptions) -> Vec<&'static str> {
        let mut columns = BASE_COLUMNS.to_vec();
        if options.stats {
            columns.extend_from_slice(STATS_COLUMNS);
        }
        if options.private_info {
            columns.extend_from_slice(PRIVATE_COLUMNS);
        }
        columns
    }

    fn upsert_sql(options: UpsertOptions) -> String {
        let columns = Self::columns(options);
        let placeholders = vec!["?"; columns.len() + 1].join(", ");
        let updates = columns
            .iter()
            .map(|column| format!("{column} = excluded.{column}"))
            .collect::<Vec<_>>()
            .join(",\n    ");

        format!(
            "INSERT INTO collection (collection_id, {}) VALUES ({})\n\
             ON CONFLICT(collection_id) DO UPDATE SET\n    {}",
            columns.join(", "),
            placeholders,
            updates
        )
    }

    fn bind_item<'q>(
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
        item: &'q CollectionItem,
        options: UpsertOptions,
    ) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        let mut query = query
            .bind(item.collection_id)
            .bind(item.game_id)
            .bind(&item.subtype)
            .bind(&item.name)
            .bind(item.sort_index)
            .bind(item.year_published)
            .bind(&item.image_url)
            .bind(&item.thumbnail_url)
            .bind(item.own)
            .bind(item.previously_owned)
            .bind(item.for_trade)
            .bind(item.want)
            .bind(item.want_to_play)
            .bind(item.want_to_buy)
            .bind(item.wishlist)
            .bind(item.wishlist_priority)
            .bind(item.preordered)
            .bind(&item.last_modified)
            .bind(item.num_plays)
            .bind(&item.comment)
            .bind(item.updated_list);

        if options.stats {
            query = query
                .bind(item.rating)
                .bind(item.min_players)
                .bind(item.max_players)
                .bind(item.min_playtime)
                .bind(item.max_playtime)
                .bind(item.playing_time)
                .bind(item.num_owned)
                .bind(item.users_rated)
                .bind(item.average)
                .bind(item.bayes_average);
        }

        if options.private_info {
            query = query
                .bind(&item.price_paid_currency)
                .bind(item.price_paid)
                .bind(&item.current_value_currency)
                .bind(item.current_value)
                .bind(item.quantity)
                .bind(&item.acquisition_date)
                .bind(&item.acquired_from)
                .bind(&item.inventory_location)
                .bind(&item.private_comment);
        }

        query
    }
}

#[async_trait]
impl CollectionRepository for SqliteCollectionRepository {
    async fn upsert_batch(&self, items: &[CollectionItem], options: UpsertOptions) -> Result<u64> {
        if items.is_empty() {
            return Ok(0);
        }

        for item in items {
            item.validate().map_err(|msg| LibraryError::InvalidInput {
                field: format!("collection item {}", item.collection_id),
                message: msg,
            })?;
        }

        let sql = Self::upsert_sql(options);
        let mut tx = self.pool.begin().await?;
        let mut written = 0;

        for item in items {
            let result = Self::bind_item(sqlx::query(&sql), item, options)
                .execute(&mut *tx)
                .await?;
            written += result.rows_affected();
        }

        tx.commit().await?;

        debug!(
            written,
            stats = options.stats,
            private_info = options.private_info,
            "Upserted collection items"
        );
        Ok(written)
    }

    async fn find_by_collection_id(&self, collection_id: i64) -> Result<Option<CollectionItem>> {
        let item =
            query_as::<_, CollectionItem>("SELECT * FROM collection WHERE collection_id = ?")
                .bind(collection_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(item)
    }

    async fn find_by_game(&self, game_id: i64) -> Result<Vec<CollectionItem>> {
        let items = query_as::<_, CollectionItem>(
            "SELECT * FROM collection WHERE game_id = ? ORDER BY collection_id",
        )
        .bind(game_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    async fn query(&self, page_request: PageRequest) -> Result<Page<CollectionItem>> {
        let total = self.count().await?;

        let items = query_as::<_, CollectionItem>(
            r#"
            SELECT * FROM collection
            ORDER BY substr(name, max(sort_index, 1)) COLLATE NOCASE, collection_id
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(page_request.limit() as i64)
        .bind(page_request.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(items, total as u64, page_request))
    }

    async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM collection")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn delete_updated_before(&self, timestamp: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM collection WHERE updated_list < ?")
            .bind(timestamp)
            .execute(&self.pool)
            .await?;

        debug!(
            timestamp,
            deleted = result.rows_affected(),
            "Deleted stale collection items"
        );
        Ok(result.rows_affected())
    }

    async fn delete_all(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM collection")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;

    fn item(collection_id: i64, game_id: i64, name: &str, updated_list: i64) -> CollectionItem {
        let mut item = CollectionItem::new(collection_id, game_id, "boardgame", name);
        item.own = true;
        item.updated_list = updated_list;
        item
    }

    async fn repository() -> SqliteCollectionRepository {
        SqliteCollectionRepository::new(create_test_pool().await.unwrap())
    }

    #[test]
    fn test_upsert_sql_column_groups() {
        let base = SqliteCollectionRepository::upsert_sql(UpsertOptions::default());
        assert!(base.contains("updated_list = excluded.updated_list"));
        assert!(!base.contains("rating"));
        assert!(!base.contains("price_paid"));

        let all = SqliteCollectionRepository::upsert_sql(UpsertOptions::all());
        assert!(all.contains("bayes_average = excluded.bayes_average"));
        assert!(all.contains("private_comment = excluded.private_comment"));
        assert_eq!(
            all.matches('?').count(),
            1 + BASE_COLUMNS.len() + STATS_COLUMNS.len() + PRIVATE_COLUMNS.len()
        );
    }

    #[core_async::test]
    async fn test_upsert_inserts_then_updates() {
        let repo = repository().await;

        let written = repo
            .upsert_batch(&[item(1, 13, "Catan", 100)], UpsertOptions::all())
            .await
            .unwrap();
        assert_eq!(written, 1);

        let mut updated = item(1, 13, "Catan", 200);
        updated.num_plays = 12;
        updated.own = false;
        updated.previously_owned = true;
        repo.upsert_batch(&[updated], UpsertOptions::all())
            .await
            .unwrap();

        let stored = repo.find_by_collection_id(1).await.unwrap().unwrap();
        assert_eq!(stored.num_plays, 12);
        assert!(!stored.own);
        assert!(stored.previously_owned);
        assert_eq!(stored.updated_list, 200);
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[core_async::test]
    async fn test_upsert_without_stats_keeps_existing_stats() {
        let repo = repository().await;

        let mut full = item(7, 822, "Carcassonne", 100);
        full.rating = Some(8.5);
        full.average = Some(7.4);
        full.price_paid = Some(35.0);
        repo.upsert_batch(&[full], UpsertOptions::all())
            .await
            .unwrap();

        let mut partial = item(7, 822, "Carcassonne", 300);
        partial.num_plays = 4;
        repo.upsert_batch(&[partial], UpsertOptions::default())
            .await
            .unwrap();

        let stored = repo.find_by_collection_id(7).await.unwrap().unwrap();
        assert_eq!(stored.num_plays, 4);
        assert_eq!(stored.updated_list, 300);
        assert_eq!(stored.rating, Some(8.5));
        assert_eq!(stored.average, Some(7.4));
        assert_eq!(stored.price_paid, Some(35.0));
    }

    #[core_async::test]
    async fn test_invalid_item_rejects_whole_batch() {
        let repo = repository().await;

        let result = repo
            .upsert_batch(
                &[item(1, 13, "Catan", 100), item(2, 14, "", 100)],
                UpsertOptions::default(),
            )
            .await;

        assert!(matches!(result, Err(LibraryError::InvalidInput { .. })));
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[core_async::test]
    async fn test_delete_updated_before_is_strict() {
        let repo = repository().await;
        repo.upsert_batch(
            &[
                item(1, 10, "Old", 99),
                item(2, 20, "Exact", 100),
                item(3, 30, "New", 101),
            ],
            UpsertOptions::default(),
        )
        .await
        .unwrap();

        let deleted = repo.delete_updated_before(100).await.unwrap();

        assert_eq!(deleted, 1);
        assert!(repo.find_by_collection_id(1).await.unwrap().is_none());
        assert!(repo.find_by_collection_id(2).await.unwrap().is_some());
        assert!(repo.find_by_collection_id(3).await.unwrap().is_some());
    }

    #[core_async::test]
    async fn test_same_game_twice() {
        let repo = repository().await;
        repo.upsert_batch(
            &[item(1, 13, "Catan", 1), item(2, 13, "Catan", 1)],
            UpsertOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(repo.find_by_game(13).await.unwrap().len(), 2);
    }

    #[core_async::test]
    async fn test_query_orders_by_sort_name() {
        let repo = repository().await;

        let mut castles = item(1, 84876, "The Castles of Burgundy", 1);
        castles.sort_index = 5;
        repo.upsert_batch(
            &[castles, item(2, 13, "Catan", 1), item(3, 822, "Agricola", 1)],
            UpsertOptions::default(),
        )
        .await
        .unwrap();

        let page = repo.query(PageRequest::new(0, 2)).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.total_pages, 2);
        let names: Vec<_> = page.items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Agricola", "The Castles of Burgundy"]);
    }

    #[core_async::test]
    async fn test_delete_all() {
        let repo = repository().await;
        repo.upsert_batch(
            &[item(1, 13, "Catan", 1), item(2, 14, "Azul", 1)],
            UpsertOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(repo.delete_all().await.unwrap(), 2);
        assert_eq!(repo.count().await.unwrap(), 0);
    }
}
