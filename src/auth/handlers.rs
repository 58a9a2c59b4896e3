use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, ProfileUpdateRequest, SignupRequest},
        extractors::CurrentUser,
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo::User,
    },
    error::DomainError,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
        .route("/auth/profile", patch(update_profile))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    Json(mut payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), (StatusCode, String)> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err((StatusCode::BAD_REQUEST, "Invalid email".into()));
    }
    if payload.username.chars().count() < 3 {
        warn!("username too short");
        return Err((StatusCode::BAD_REQUEST, "Username too short".into()));
    }
    if payload.password.len() < 6 {
        warn!("password too short");
        return Err((StatusCode::BAD_REQUEST, "Password too short".into()));
    }

    // Domain failures keep the 201 the route promises; only the body says no.
    if User::find_by_email(&state.db, &payload.email)
        .await
        .map_err(internal)?
        .is_some()
    {
        warn!(email = %payload.email, "email already registered");
        return Ok((
            StatusCode::CREATED,
            Json(AuthResponse::err(DomainError::DuplicateEmail.to_string())),
        ));
    }
    if User::find_by_username(&state.db, &payload.username)
        .await
        .map_err(internal)?
        .is_some()
    {
        warn!(username = %payload.username, "username already taken");
        return Ok((
            StatusCode::CREATED,
            Json(AuthResponse::err(DomainError::DuplicateUsername.to_string())),
        ));
    }

    let hash = hash_password(&payload.password).map_err(internal)?;

    // Two signups can still race past the checks above; the unique
    // constraint settles it and maps back to the same domain error.
    let user = match User::create(&state.db, &payload.username, &payload.email, &hash)
        .await
        .map_err(internal)?
    {
        Ok(user) => user,
        Err(domain) => {
            warn!(error = %domain, "signup lost uniqueness race");
            return Ok((StatusCode::CREATED, Json(AuthResponse::err(domain.to_string()))));
        }
    };

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id).map_err(internal)?;

    info!(user_id = %user.id, username = %user.username, "user signed up");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse::ok(user.into(), Some(token))),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err((StatusCode::BAD_REQUEST, "Invalid email".into()));
    }
    if payload.password.len() < 4 {
        warn!("password too short");
        return Err((StatusCode::BAD_REQUEST, "Password too short".into()));
    }

    let user = match User::find_by_email(&state.db, &payload.email)
        .await
        .map_err(internal)?
    {
        Some(u) => u,
        None => {
            warn!(email = %payload.email, "login unknown email");
            return Ok(Json(AuthResponse::err(
                DomainError::InvalidCredentials.to_string(),
            )));
        }
    };

    let ok = verify_password(&payload.password, &user.password_hash).map_err(internal)?;
    if !ok {
        warn!(email = %payload.email, user_id = %user.id, "login invalid password");
        return Ok(Json(AuthResponse::err(
            DomainError::InvalidCredentials.to_string(),
        )));
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id).map_err(internal)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(AuthResponse::ok(user.into(), Some(token))))
}

/// Tokens are not revoked server-side; expiry is the only invalidation.
#[instrument(skip_all)]
pub async fn logout(CurrentUser(_user): CurrentUser) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "success": true }))
}

#[instrument(skip_all)]
pub async fn me(CurrentUser(user): CurrentUser) -> Json<AuthResponse> {
    Json(AuthResponse::ok(user.into(), None))
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<ProfileUpdateRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    if let Some(email) = &payload.email {
        if !is_valid_email(&email.trim().to_lowercase()) {
            warn!(email = %email, "invalid email");
            return Err((StatusCode::BAD_REQUEST, "Invalid email".into()));
        }
    }

    let updated = User::update_profile(&state.db, user.id, &payload)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::UNAUTHORIZED, "User not found".to_string()))?;

    info!(user_id = %updated.id, "profile updated");
    Ok(Json(AuthResponse::ok(updated.into(), None)))
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %e, "internal error");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
