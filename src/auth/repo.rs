use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::dto::ProfileUpdateRequest;
use crate::error::DomainError;

/// User record in the database. `password_hash` never leaves the process.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: OffsetDateTime,
    pub high_score: i64,
    pub total_chops: i64,
    pub games_played: i64,
}

const USER_COLUMNS: &str =
    "id, username, email, password_hash, created_at, high_score, total_chops, games_played";

impl User {
    /// Find a user by email (stored lower-cased, compared case-insensitively).
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email.to_lowercase())
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Find a user by username, ignoring case. Signup uses this for the
    /// duplicate check even though the stored column compares exactly.
    pub async fn find_by_username(db: &PgPool, username: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(username) = LOWER($1)"
        ))
        .bind(username)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Create a new user with all counters at zero. A unique-constraint
    /// violation (two signups racing) comes back as the matching domain
    /// error instead of an infrastructure failure.
    pub async fn create(
        db: &PgPool,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> anyhow::Result<Result<User, DomainError>> {
        let res = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(username)
        .bind(email.to_lowercase())
        .bind(password_hash)
        .fetch_one(db)
        .await;

        match res {
            Ok(user) => Ok(Ok(user)),
            Err(e) => match unique_violation(&e) {
                Some(domain) => Ok(Err(domain)),
                None => Err(e.into()),
            },
        }
    }

    /// Apply only the fields present in the request; everything else is
    /// untouched. No uniqueness re-check here.
    pub async fn update_profile(
        db: &PgPool,
        id: Uuid,
        updates: &ProfileUpdateRequest,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET username = COALESCE($2, username),
                email = COALESCE($3, email),
                high_score = COALESCE($4, high_score),
                total_chops = COALESCE($5, total_chops),
                games_played = COALESCE($6, games_played)
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(updates.username.as_deref())
        .bind(updates.email.as_deref().map(str::to_lowercase))
        .bind(updates.high_score)
        .bind(updates.total_chops)
        .bind(updates.games_played)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Record one finished game: bump the play counter, accumulate chops,
    /// and raise the high score if the new score exceeds it.
    pub async fn apply_game_result(
        db: &PgPool,
        id: Uuid,
        score: i64,
        chops: i64,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET games_played = games_played + 1,
                total_chops = total_chops + $2,
                high_score = GREATEST(high_score, $3)
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(chops)
        .bind(score)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }
}

fn unique_violation(e: &sqlx::Error) -> Option<DomainError> {
    let db_err = match e {
        sqlx::Error::Database(db_err) => db_err,
        _ => return None,
    };
    if !db_err.is_unique_violation() {
        return None;
    }
    match db_err.constraint() {
        Some("users_email_key") => Some(DomainError::DuplicateEmail),
        Some("users_username_key") => Some(DomainError::DuplicateUsername),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seed_user(db: &PgPool, username: &str, email: &str) -> User {
        User::create(db, username, email, "test-hash")
            .await
            .expect("create query")
            .expect("no duplicate")
    }

    #[sqlx::test]
    async fn new_users_start_with_zeroed_counters(db: PgPool) {
        let user = seed_user(&db, "Paul", "paul@x.com").await;
        assert_eq!(user.high_score, 0);
        assert_eq!(user.total_chops, 0);
        assert_eq!(user.games_played, 0);
        assert_eq!(user.email, "paul@x.com");
    }

    #[sqlx::test]
    async fn game_results_accumulate_and_keep_the_max_score(db: PgPool) {
        let user = seed_user(&db, "Paul", "paul@x.com").await;
        for (score, chops) in [(5000, 250), (3000, 100), (7000, 50)] {
            User::apply_game_result(&db, user.id, score, chops)
                .await
                .expect("apply query")
                .expect("user exists");
        }
        let user = User::find_by_id(&db, user.id)
            .await
            .expect("find query")
            .expect("user exists");
        assert_eq!(user.high_score, 7000);
        assert_eq!(user.total_chops, 400);
        assert_eq!(user.games_played, 3);
    }

    #[sqlx::test]
    async fn duplicate_email_maps_to_domain_error(db: PgPool) {
        seed_user(&db, "Paul", "paul@x.com").await;
        // Emails are stored lower-cased, so the constraint also catches a
        // differently-cased duplicate.
        let second = User::create(&db, "Paula", "PAUL@X.COM", "test-hash")
            .await
            .expect("create query");
        assert_eq!(second.unwrap_err(), DomainError::DuplicateEmail);
    }

    #[sqlx::test]
    async fn duplicate_username_maps_to_domain_error(db: PgPool) {
        seed_user(&db, "Paul", "paul@x.com").await;
        let second = User::create(&db, "Paul", "other@x.com", "test-hash")
            .await
            .expect("create query");
        assert_eq!(second.unwrap_err(), DomainError::DuplicateUsername);
    }

    #[sqlx::test]
    async fn username_lookup_ignores_case(db: PgPool) {
        seed_user(&db, "Paul", "paul@x.com").await;
        let found = User::find_by_username(&db, "pAuL")
            .await
            .expect("find query");
        assert!(found.is_some());
    }

    #[sqlx::test]
    async fn profile_update_touches_only_provided_fields(db: PgPool) {
        let user = seed_user(&db, "Paul", "paul@x.com").await;
        let updates = ProfileUpdateRequest {
            username: Some("Axe".into()),
            high_score: Some(42),
            ..Default::default()
        };
        let updated = User::update_profile(&db, user.id, &updates)
            .await
            .expect("update query")
            .expect("user exists");
        assert_eq!(updated.username, "Axe");
        assert_eq!(updated.high_score, 42);
        assert_eq!(updated.email, "paul@x.com");
        assert_eq!(updated.total_chops, 0);
        assert_eq!(updated.games_played, 0);
    }
}
