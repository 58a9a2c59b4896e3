use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{error, info, instrument};

use crate::{
    auth::{extractors::CurrentUser, repo::User},
    leaderboard::{
        dto::{
            annotate, clamp_limit, LeaderboardQuery, LeaderboardResponse, ScoreSubmitRequest,
            DEFAULT_LIMIT,
        },
        repo,
    },
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/leaderboard", get(get_leaderboard))
        .route("/leaderboard", post(submit_score))
}

#[instrument(skip(state))]
pub async fn get_leaderboard(
    State(state): State<AppState>,
    Query(q): Query<LeaderboardQuery>,
) -> Result<Json<LeaderboardResponse>, (StatusCode, String)> {
    let entries = load_leaderboard(&state, q.limit).await.map_err(internal)?;
    Ok(Json(LeaderboardResponse {
        success: true,
        entries,
        user_rank: None,
        error: None,
    }))
}

#[instrument(skip(state, payload))]
pub async fn submit_score(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<ScoreSubmitRequest>,
) -> Result<Json<LeaderboardResponse>, (StatusCode, String)> {
    User::apply_game_result(&state.db, user.id, payload.score, payload.chops)
        .await
        .map_err(internal)?;
    info!(user_id = %user.id, score = payload.score, chops = payload.chops, "score submitted");

    let entries = load_leaderboard(&state, DEFAULT_LIMIT)
        .await
        .map_err(internal)?;
    let user_rank = repo::user_rank(&state.db, user.id).await.map_err(internal)?;
    Ok(Json(LeaderboardResponse {
        success: true,
        entries,
        user_rank,
        error: None,
    }))
}

async fn load_leaderboard(
    state: &AppState,
    limit: i64,
) -> anyhow::Result<Vec<crate::leaderboard::dto::LeaderboardEntry>> {
    let rows = repo::top_users(&state.db, clamp_limit(limit)).await?;
    Ok(annotate(rows, OffsetDateTime::now_utc()))
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %e, "internal error");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
