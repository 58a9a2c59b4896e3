use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::leaderboard::repo::LeaderboardRow;

pub const DEFAULT_LIMIT: i64 = 10;

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

/// Out-of-range limits are clamped rather than rejected.
pub fn clamp_limit(limit: i64) -> i64 {
    limit.clamp(1, 100)
}

/// Request body for POST /leaderboard.
#[derive(Debug, Deserialize)]
pub struct ScoreSubmitRequest {
    pub score: i64,
    pub chops: i64,
}

/// A user's rank-annotated summary for display.
#[derive(Debug, Serialize)]
pub struct LeaderboardEntry {
    pub id: Uuid,
    pub username: String,
    pub score: i64,
    pub chops: i64,
    pub rank: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

#[derive(Debug, Serialize)]
pub struct LeaderboardResponse {
    pub success: bool,
    pub entries: Vec<LeaderboardEntry>,
    #[serde(rename = "userRank", skip_serializing_if = "Option::is_none")]
    pub user_rank: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Annotate sorted rows with their 1-based rank.
pub fn annotate(rows: Vec<LeaderboardRow>, timestamp: OffsetDateTime) -> Vec<LeaderboardEntry> {
    rows.into_iter()
        .enumerate()
        .map(|(i, row)| LeaderboardEntry {
            id: row.id,
            username: row.username,
            score: row.high_score,
            chops: row.total_chops,
            rank: i as i64 + 1,
            timestamp,
        })
        .collect()
}
