use crate::state::SharedState;
use crate::web::error::ApiError;
use crate::web::session::{sign_access_token, CurrentUser};
use crate::web::users::UserProfile;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use argon2::{password_hash::PasswordHash, Argon2, PasswordVerifier};
use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct LogoutRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub user: UserProfile,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
        .route("/me", get(me))
        .with_state(state)
}

fn new_refresh_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(48)
        .map(char::from)
        .collect()
}

fn session_cookie(access_token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Ok(value) =
        format!("session={access_token}; HttpOnly; SameSite=Lax; Path=/").parse()
    {
        headers.insert(axum::http::header::SET_COOKIE, value);
    }
    headers
}

async fn login(
    State(state): State<SharedState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = payload.email.trim().to_lowercase();

    if !state.login_throttle.allow(&email).await {
        tracing::warn!("login throttled for {email}");
        return Err(ApiError::RateLimited);
    }

    let user = state
        .store
        .find_user_by_email(&email)
        .await
        .filter(|u| u.is_active)
        .ok_or(ApiError::Unauthorized)?;

    let parsed_hash = PasswordHash::new(&user.hash).map_err(|_| ApiError::Unauthorized)?;
    Argon2::default()
        .verify_password(payload.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Unauthorized)?;

    state.login_throttle.reset(&email).await;

    let now = Utc::now();
    let access_token = sign_access_token(
        user.id,
        user.role,
        &state.config.session_key,
        now,
        state.config.access_ttl(),
    )
    .map_err(|e| ApiError::internal("failed to sign access token", e))?;

    let refresh_token = new_refresh_token();
    state
        .store
        .create_session(refresh_token.clone(), user.id, now, state.config.refresh_ttl())
        .await;

    tracing::info!("user {} logged in", user.id);

    let body = TokenResponse {
        access_token: access_token.clone(),
        refresh_token,
        expires_in: state.config.access_ttl().num_seconds(),
        user: UserProfile::from(&user),
    };
    Ok((session_cookie(&access_token), Json(body)))
}

/// Rotates the refresh token. Concurrent calls with the same token queue on
/// the session table and all receive the pair minted by the first one.
async fn refresh(
    State(state): State<SharedState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let now = Utc::now();

    let session = state
        .store
        .find_session(&payload.refresh_token, now)
        .await
        .ok_or(ApiError::Unauthorized)?;

    let user = state
        .store
        .find_user_by_id(session.user_id)
        .await
        .ok_or(ApiError::Unauthorized)?;
    if !user.is_active {
        state.store.revoke_user_sessions(user.id).await;
        return Err(ApiError::Unauthorized);
    }

    let candidate_access = sign_access_token(
        user.id,
        user.role,
        &state.config.session_key,
        now,
        state.config.access_ttl(),
    )
    .map_err(|e| ApiError::internal("failed to sign access token", e))?;

    let outcome = state
        .store
        .rotate_session(
            &payload.refresh_token,
            candidate_access,
            new_refresh_token(),
            now,
            state.config.refresh_ttl(),
            state.config.refresh_replay_grace(),
        )
        .await
        .map_err(|_| ApiError::Unauthorized)?;

    if outcome.replayed {
        tracing::debug!("refresh replayed for user {}", user.id);
    }

    let body = TokenResponse {
        access_token: outcome.access_token.clone(),
        refresh_token: outcome.refresh_token,
        expires_in: state.config.access_ttl().num_seconds(),
        user: UserProfile::from(&user),
    };
    Ok((session_cookie(&outcome.access_token), Json(body)))
}

async fn logout(
    State(state): State<SharedState>,
    Json(payload): Json<LogoutRequest>,
) -> impl IntoResponse {
    state.store.revoke_session(&payload.refresh_token).await;

    let mut headers = HeaderMap::new();
    if let Ok(value) = "session=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0".parse() {
        headers.insert(axum::http::header::SET_COOKIE, value);
    }
    (headers, StatusCode::NO_CONTENT)
}

async fn me(
    user: CurrentUser,
    State(state): State<SharedState>,
) -> Result<Json<UserProfile>, ApiError> {
    let user = state
        .store
        .find_user_by_id(user.id)
        .await
        .ok_or(ApiError::Unauthorized)?;
    Ok(Json(UserProfile::from(&user)))
}
