use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::extractors::CurrentUser,
    error::DomainError,
    game::{
        dto::{compute_stats, SessionEndRequest, SessionResponse, StatsResponse},
        repo::GameSession,
    },
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/game/session", post(start_session))
        .route("/game/session/:id/end", post(end_session))
        .route("/game/stats", get(get_stats))
}

#[instrument(skip(state))]
pub async fn start_session(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<(StatusCode, Json<SessionResponse>), (StatusCode, String)> {
    let session = GameSession::create(&state.db, user.id)
        .await
        .map_err(internal)?;
    info!(user_id = %user.id, session_id = %session.id, "session started");
    Ok((StatusCode::CREATED, Json(SessionResponse::ok(session))))
}

#[instrument(skip(state, payload))]
pub async fn end_session(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(session_id): Path<Uuid>,
    Json(payload): Json<SessionEndRequest>,
) -> Result<Json<SessionResponse>, (StatusCode, String)> {
    let session = GameSession::end(
        &state.db,
        session_id,
        payload.score,
        payload.chops,
        payload.duration,
    )
    .await
    .map_err(internal)?;

    match session {
        Some(session) => {
            info!(
                session_id = %session.id,
                user_id = %session.user_id,
                score = payload.score,
                "session ended"
            );
            Ok(Json(SessionResponse::ok(session)))
        }
        None => {
            warn!(%session_id, caller = %user.id, "unknown session");
            Ok(Json(SessionResponse::err(
                DomainError::SessionNotFound.to_string(),
            )))
        }
    }
}

#[instrument(skip_all)]
pub async fn get_stats(CurrentUser(user): CurrentUser) -> Json<StatsResponse> {
    Json(StatsResponse {
        success: true,
        stats: compute_stats(user.games_played, user.total_chops, user.high_score),
    })
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %e, "internal error");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
