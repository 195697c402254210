use crate::domain::models::UserRole;
use crate::state::SharedState;
use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, HeaderMap},
};
use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

use crate::web::error::ApiError;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone)]
pub struct AccessClaims {
    pub user_id: Uuid,
    pub role: UserRole,
    pub exp: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("invalid token format")]
    Invalid,
    #[error("signature mismatch")]
    Signature,
    #[error("expired")]
    Expired,
    #[error("bad role")]
    Role,
}

pub fn sign_access_token(
    user_id: Uuid,
    role: UserRole,
    key: &[u8],
    now: DateTime<Utc>,
    ttl: Duration,
) -> Result<String, TokenError> {
    let exp = (now + ttl).timestamp();
    let payload = format!("{}|{}|{}", user_id, role.as_str(), exp);
    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| TokenError::Invalid)?;
    mac.update(payload.as_bytes());
    let sig = mac.finalize().into_bytes();
    Ok(format!(
        "{}.{}",
        general_purpose::STANDARD.encode(payload.as_bytes()),
        general_purpose::STANDARD.encode(sig)
    ))
}

pub fn verify_access_token(
    token: &str,
    key: &[u8],
    now: DateTime<Utc>,
) -> Result<AccessClaims, TokenError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 2 {
        return Err(TokenError::Invalid);
    }
    let payload_bytes = general_purpose::STANDARD
        .decode(parts[0])
        .map_err(|_| TokenError::Invalid)?;
    let sig_bytes = general_purpose::STANDARD
        .decode(parts[1])
        .map_err(|_| TokenError::Invalid)?;

    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| TokenError::Invalid)?;
    mac.update(&payload_bytes);
    mac.verify_slice(&sig_bytes)
        .map_err(|_| TokenError::Signature)?;

    let payload = String::from_utf8(payload_bytes).map_err(|_| TokenError::Invalid)?;
    let pieces: Vec<&str> = payload.split('|').collect();
    if pieces.len() != 3 {
        return Err(TokenError::Invalid);
    }
    let user_id = Uuid::parse_str(pieces[0]).map_err(|_| TokenError::Invalid)?;
    let role = UserRole::try_from(pieces[1]).map_err(|_| TokenError::Role)?;
    let exp: i64 = pieces[2].parse().map_err(|_| TokenError::Invalid)?;
    if now.timestamp() > exp {
        return Err(TokenError::Expired);
    }
    Ok(AccessClaims { user_id, role, exp })
}

/// Bearer header first, session cookie second.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth) = headers.get(axum::http::header::AUTHORIZATION) {
        if let Ok(val) = auth.to_str() {
            if let Some(bearer) = val.strip_prefix("Bearer ") {
                return Some(bearer.trim().to_string());
            }
        }
    }
    if let Some(cookie) = headers.get(axum::http::header::COOKIE) {
        if let Ok(val) = cookie.to_str() {
            for pair in val.split(';') {
                if let Some(rest) = pair.trim().strip_prefix("session=") {
                    return Some(rest.to_string());
                }
            }
        }
    }
    None
}

/// Authenticated, active user. Rejects with 401 otherwise.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub role: UserRole,
}

impl CurrentUser {
    pub fn require_manager(&self) -> Result<(), ApiError> {
        if self.role.is_manager() {
            Ok(())
        } else {
            Err(ApiError::Forbidden)
        }
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.role == UserRole::Admin {
            Ok(())
        } else {
            Err(ApiError::Forbidden)
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    SharedState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = SharedState::from_ref(state);

        let token = extract_token(&parts.headers).ok_or(ApiError::Unauthorized)?;
        let claims = verify_access_token(&token, &state.config.session_key, Utc::now())
            .map_err(|e| {
                tracing::warn!("access token rejected: {e}");
                ApiError::Unauthorized
            })?;

        let user = state
            .store
            .find_user_by_id(claims.user_id)
            .await
            .ok_or(ApiError::Unauthorized)?;
        if !user.is_active {
            return Err(ApiError::Unauthorized);
        }

        // the stored role wins over whatever the token was signed with
        Ok(CurrentUser {
            id: user.id,
            role: user.role,
        })
    }
}

/// Optional variant for page routes: never rejects, carries what it found.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<CurrentUser>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
    SharedState: FromRef<S>,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(
            CurrentUser::from_request_parts(parts, state).await.ok(),
        ))
    }
}
