use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::game::repo::GameSession;

/// Request body for ending a session.
#[derive(Debug, Deserialize)]
pub struct SessionEndRequest {
    pub score: i64,
    pub chops: i64,
    pub duration: f64,
}

/// Session as the API exposes it, camelCase with RFC 3339 timestamps.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionJson {
    pub id: Uuid,
    pub user_id: Uuid,
    pub score: i64,
    pub chops: i64,
    pub duration: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub ended_at: Option<OffsetDateTime>,
}

impl From<GameSession> for SessionJson {
    fn from(s: GameSession) -> Self {
        Self {
            id: s.id,
            user_id: s.user_id,
            score: s.score,
            chops: s.chops,
            duration: s.duration,
            started_at: s.started_at,
            ended_at: s.ended_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionJson>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SessionResponse {
    pub fn ok(session: GameSession) -> Self {
        Self {
            success: true,
            session: Some(session.into()),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            session: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_games: i64,
    pub avg_score: i64,
    pub top_score: i64,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub success: bool,
    pub stats: Stats,
}

/// Per-user stats summary. The average is chops-per-game, rounded to the
/// nearest integer with ties going to even, zero before the first game.
pub fn compute_stats(games_played: i64, total_chops: i64, high_score: i64) -> Stats {
    let avg_score = if games_played > 0 {
        (total_chops as f64 / games_played as f64).round_ties_even() as i64
    } else {
        0
    };
    Stats {
        total_games: games_played,
        avg_score,
        top_score: high_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn stats_average_rounds_to_nearest() {
        let stats = compute_stats(3, 250, 5000);
        assert_eq!(stats.total_games, 3);
        assert_eq!(stats.avg_score, 83); // 250 / 3 = 83.33
        assert_eq!(stats.top_score, 5000);
    }

    #[test]
    fn stats_average_rounds_ties_to_even() {
        assert_eq!(compute_stats(2, 3, 0).avg_score, 2); // 1.5 -> 2
        assert_eq!(compute_stats(2, 5, 0).avg_score, 2); // 2.5 -> 2
        assert_eq!(compute_stats(2, 7, 0).avg_score, 4); // 3.5 -> 4
    }

    #[test]
    fn stats_average_is_zero_before_first_game() {
        let stats = compute_stats(0, 0, 0);
        assert_eq!(stats.avg_score, 0);
        assert_eq!(stats.total_games, 0);
    }

    #[test]
    fn stats_serialize_camel_case() {
        let json = serde_json::to_value(StatsResponse {
            success: true,
            stats: compute_stats(1, 250, 5000),
        })
        .unwrap();
        assert_eq!(json["stats"]["totalGames"], 1);
        assert_eq!(json["stats"]["avgScore"], 250);
        assert_eq!(json["stats"]["topScore"], 5000);
    }

    #[test]
    fn active_session_serializes_null_ended_at() {
        let session = GameSession {
            id: Uuid::nil(),
            user_id: Uuid::nil(),
            score: 0,
            chops: 0,
            duration: 0.0,
            started_at: datetime!(2024-06-01 12:00:00 UTC),
            ended_at: None,
        };
        let json = serde_json::to_value(SessionResponse::ok(session)).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["session"]["userId"], Uuid::nil().to_string());
        assert_eq!(json["session"]["startedAt"], "2024-06-01T12:00:00Z");
        assert_eq!(json["session"]["endedAt"], serde_json::Value::Null);
    }

    #[test]
    fn error_response_carries_no_session() {
        let json = serde_json::to_value(SessionResponse::err("Session not found")).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Session not found");
        assert!(json.get("session").is_none());
    }
}
