use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Game session record. `ended_at` null means the session is still active.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GameSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub score: i64,
    pub chops: i64,
    pub duration: f64,
    pub started_at: OffsetDateTime,
    pub ended_at: Option<OffsetDateTime>,
}

const SESSION_COLUMNS: &str = "id, user_id, score, chops, duration, started_at, ended_at";

impl GameSession {
    /// Start a session with zeroed score and chops. A user may hold any
    /// number of active sessions at once.
    pub async fn create(db: &PgPool, user_id: Uuid) -> anyhow::Result<GameSession> {
        let session = sqlx::query_as::<_, GameSession>(&format!(
            r#"
            INSERT INTO game_sessions (user_id)
            VALUES ($1)
            RETURNING {SESSION_COLUMNS}
            "#
        ))
        .bind(user_id)
        .fetch_one(db)
        .await?;
        Ok(session)
    }

    /// End a session and fold its result into the owning user's stats, in
    /// one transaction. The session's stored `user_id` is authoritative,
    /// not the caller. Returns `None` (nothing mutated) for an unknown id.
    pub async fn end(
        db: &PgPool,
        session_id: Uuid,
        score: i64,
        chops: i64,
        duration: f64,
    ) -> anyhow::Result<Option<GameSession>> {
        let mut tx = db.begin().await?;

        let session = sqlx::query_as::<_, GameSession>(&format!(
            r#"
            UPDATE game_sessions
            SET score = $2, chops = $3, duration = $4, ended_at = now()
            WHERE id = $1
            RETURNING {SESSION_COLUMNS}
            "#
        ))
        .bind(session_id)
        .bind(score)
        .bind(chops)
        .bind(duration)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(session) = session else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query(
            r#"
            UPDATE users
            SET games_played = games_played + 1,
                total_chops = total_chops + $2,
                high_score = GREATEST(high_score, $3)
            WHERE id = $1
            "#,
        )
        .bind(session.user_id)
        .bind(chops)
        .bind(score)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(session))
    }
}
