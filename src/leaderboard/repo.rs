use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// The slice of a user row the leaderboard needs.
#[derive(Debug, Clone, FromRow)]
pub struct LeaderboardRow {
    pub id: Uuid,
    pub username: String,
    pub high_score: i64,
    pub total_chops: i64,
}

/// Top users by high score. Ties break on creation time, then id, so the
/// ordering is stable across reads.
pub async fn top_users(db: &PgPool, limit: i64) -> anyhow::Result<Vec<LeaderboardRow>> {
    let rows = sqlx::query_as::<_, LeaderboardRow>(
        r#"
        SELECT id, username, high_score, total_chops
        FROM users
        ORDER BY high_score DESC, created_at ASC, id ASC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// 1-based rank of a single user under the same ordering as `top_users`.
pub async fn user_rank(db: &PgPool, user_id: Uuid) -> anyhow::Result<Option<i64>> {
    let rank = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT rank
        FROM (
            SELECT id,
                   ROW_NUMBER() OVER (ORDER BY high_score DESC, created_at ASC, id ASC) AS rank
            FROM users
        ) ranked
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(rank)
}
