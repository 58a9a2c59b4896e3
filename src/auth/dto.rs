use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo::User;

/// Request body for signup.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// PATCH /auth/profile body. Absent fields are left untouched; the stat
/// counters are deliberately writable here (the game client owns them).
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdateRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub high_score: Option<i64>,
    pub total_chops: Option<i64>,
    pub games_played: Option<i64>,
}

/// Public part of the user returned to the client, in the API's camelCase
/// naming. The password hash never appears here.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub high_score: i64,
    pub total_chops: i64,
    pub games_played: i64,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            created_at: u.created_at,
            high_score: u.high_score,
            total_chops: u.total_chops,
            games_played: u.games_played,
        }
    }
}

/// Response returned by signup, login, me, and profile update. Domain
/// failures ride in `error` with `success: false`, under a success status.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<PublicUser>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuthResponse {
    pub fn ok(user: PublicUser, token: Option<String>) -> Self {
        Self {
            success: true,
            user: Some(user),
            token,
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            user: None,
            token: None,
            error: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn sample_user() -> PublicUser {
        PublicUser {
            id: Uuid::nil(),
            username: "Paul".into(),
            email: "paul@x.com".into(),
            created_at: datetime!(2024-01-01 00:00:00 UTC),
            high_score: 5000,
            total_chops: 250,
            games_played: 1,
        }
    }

    #[test]
    fn public_user_serializes_camel_case() {
        let json = serde_json::to_value(sample_user()).unwrap();
        assert_eq!(json["username"], "Paul");
        assert_eq!(json["highScore"], 5000);
        assert_eq!(json["totalChops"], 250);
        assert_eq!(json["gamesPlayed"], 1);
        assert_eq!(json["createdAt"], "2024-01-01T00:00:00Z");
        assert!(json.get("password_hash").is_none());
        assert!(json.get("passwordHash").is_none());
    }

    #[test]
    fn auth_response_omits_absent_fields() {
        let json = serde_json::to_value(AuthResponse::err("Email already registered")).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Email already registered");
        assert!(json.get("user").is_none());
        assert!(json.get("token").is_none());

        let json = serde_json::to_value(AuthResponse::ok(sample_user(), Some("tok".into()))).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["token"], "tok");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn profile_update_distinguishes_absent_fields() {
        let req: ProfileUpdateRequest =
            serde_json::from_str(r#"{"username":"Axe","highScore":42}"#).unwrap();
        assert_eq!(req.username.as_deref(), Some("Axe"));
        assert_eq!(req.high_score, Some(42));
        assert_eq!(req.email, None);
        assert_eq!(req.total_chops, None);
        assert_eq!(req.games_played, None);
    }
}
