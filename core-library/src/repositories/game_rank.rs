//! Game rank repository trait and implementation

use crate::error::{LibraryError, Result};
use crate::models::GameRank;
use async_trait::async_trait;
use sqlx::{query_as, SqlitePool};
use tracing::debug;

#[async_trait]
pub trait GameRankRepository: Send + Sync {
    /// Replace the stored ranks of each listed game with the given set.
    ///
    /// A game listed with an empty vector ends up with no ranks. Games not
    /// listed are left alone. Runs in one transaction.
    ///
    /// # Returns
    /// Number of rank rows inserted
    async fn replace_for_games(&self, ranks_by_game: &[(i64, Vec<GameRank>)]) -> Result<u64>;

    /// Ranks for one game, overall rank first.
    async fn find_by_game(&self, game_id: i64) -> Result<Vec<GameRank>>;

    async fn count(&self) -> Result<i64>;

    async fn delete_all(&self) -> Result<u64>;
}

pub struct SqliteGameRankRepository {
    pool: SqlitePool,
}

impl SqliteGameRankRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GameRankRepository for SqliteGameRankRepository {
    async fn replace_for_games(&self, ranks_by_game: &[(i64, Vec<GameRank>)]) -> Result<u64> {
        for (game_id, ranks) in ranks_by_game {
            for rank in ranks {
                rank.validate().map_err(|msg| LibraryError::InvalidInput {
                    field: format!("rank for game {}", game_id),
                    message: msg,
                })?;
                if rank.game_id != *game_id {
                    return Err(LibraryError::InvalidInput {
                        field: format!("rank for game {}", game_id),
                        message: format!("rank belongs to game {}", rank.game_id),
                    });
                }
            }
        }

        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;

        for (game_id, ranks) in ranks_by_game {
            sqlx::query("DELETE FROM game_ranks WHERE game_id = ?")
                .bind(game_id)
                .execute(&mut *tx)
                .await?;

            for rank in ranks {
                let result = sqlx::query(
                    r#"
                    INSERT OR REPLACE INTO game_ranks (
                        game_id, rank_id, rank_type, name, friendly_name, value, bayes_average
                    ) VALUES (?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(rank.game_id)
                .bind(rank.rank_id)
                .bind(&rank.rank_type)
                .bind(&rank.name)
                .bind(&rank.friendly_name)
                .bind(rank.value)
                .bind(rank.bayes_average)
                .execute(&mut *tx)
                .await?;
                inserted += result.rows_affected();
            }
        }

        tx.commit().await?;

        debug!(games = ranks_by_game.len(), inserted, "Replaced game ranks");
        Ok(inserted)
    }

    async fn find_by_game(&self, game_id: i64) -> Result<Vec<GameRank>> {
        let ranks = query_as::<_, GameRank>(
            r#"
            SELECT * FROM game_ranks
            WHERE game_id = ?
            ORDER BY CASE rank_type WHEN 'subtype' THEN 0 ELSE 1 END, rank_id
            "#,
        )
        .bind(game_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ranks)
    }

    async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM game_ranks")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn delete_all(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM game_ranks")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;

    fn rank(game_id: i64, rank_id: i64, rank_type: &str, value: Option<i32>) -> GameRank {
        GameRank {
            game_id,
            rank_id,
            rank_type: rank_type.to_string(),
            name: format!("rank{}", rank_id),
            friendly_name: format!("Rank {}", rank_id),
            value,
            bayes_average: Some(7.1),
        }
    }

    #[core_async::test]
    async fn test_replace_overwrites_previous_ranks() {
        let repo = SqliteGameRankRepository::new(create_test_pool().await.unwrap());

        repo.replace_for_games(&[(
            13,
            vec![rank(13, 5497, "family", Some(80)), rank(13, 1, "subtype", Some(400))],
        )])
        .await
        .unwrap();

        let ranks = repo.find_by_game(13).await.unwrap();
        assert_eq!(ranks.len(), 2);
        assert_eq!(ranks[0].rank_type, "subtype");

        repo.replace_for_games(&[(13, vec![rank(13, 1, "subtype", None)])])
            .await
            .unwrap();

        let ranks = repo.find_by_game(13).await.unwrap();
        assert_eq!(ranks.len(), 1);
        assert_eq!(ranks[0].value, None);
    }

    #[core_async::test]
    async fn test_empty_set_clears_game_and_leaves_others() {
        let repo = SqliteGameRankRepository::new(create_test_pool().await.unwrap());

        repo.replace_for_games(&[
            (13, vec![rank(13, 1, "subtype", Some(400))]),
            (822, vec![rank(822, 1, "subtype", Some(150))]),
        ])
        .await
        .unwrap();

        repo.replace_for_games(&[(13, vec![])]).await.unwrap();

        assert!(repo.find_by_game(13).await.unwrap().is_empty());
        assert_eq!(repo.find_by_game(822).await.unwrap().len(), 1);
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[core_async::test]
    async fn test_mismatched_game_is_rejected() {
        let repo = SqliteGameRankRepository::new(create_test_pool().await.unwrap());

        let result = repo
            .replace_for_games(&[(13, vec![rank(14, 1, "subtype", Some(1))])])
            .await;

        assert!(matches!(result, Err(LibraryError::InvalidInput { .. })));
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[core_async::test]
    async fn test_delete_all() {
        let repo = SqliteGameRankRepository::new(create_test_pool().await.unwrap());
        repo.replace_for_games(&[(13, vec![rank(13, 1, "subtype", Some(1))])])
            .await
            .unwrap();

        assert_eq!(repo.delete_all().await.unwrap(), 1);
    }
}
