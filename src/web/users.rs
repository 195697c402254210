use crate::domain::models::{User, UserRole};
use crate::services::listing::{filter_by_query, paginate, ListParams, Paged};
use crate::state::SharedState;
use crate::web::error::ApiError;
use crate::web::session::CurrentUser;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outward user snapshot; the password hash never leaves the store.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub deactivated_at: Option<DateTime<Utc>>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        UserProfile {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            role: user.role,
            is_active: user.is_active,
            created_at: user.created_at,
            deactivated_at: user.deactivated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserPayload {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<UserRole>,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(list_users))
        .route("/:id", get(get_user).put(update_user).delete(delete_user))
        .route("/:id/activate", post(activate_user))
        .route("/:id/deactivate", post(deactivate_user))
        .with_state(state)
}

async fn list_users(
    requester: CurrentUser,
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Paged<UserProfile>>, ApiError> {
    requester.require_admin()?;

    let mut users = state.store.list_users().await;

    if let Some(status) = params.status.as_deref() {
        let want_active = match status.trim().to_lowercase().as_str() {
            "active" => true,
            "inactive" => false,
            other => {
                return Err(ApiError::BadRequest(format!("unknown status '{other}'")));
            }
        };
        users.retain(|u| u.is_active == want_active);
    }

    users.retain(|u| params.date_in_range(u.created_at));
    let users = filter_by_query(users, params.search());

    let page = paginate(users, params.page_request());
    Ok(Json(Paged {
        data: page.data.iter().map(UserProfile::from).collect(),
        meta: page.meta,
    }))
}

async fn get_user(
    requester: CurrentUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserProfile>, ApiError> {
    requester.require_admin()?;

    let user = state.store.find_user_by_id(id).await.ok_or(ApiError::NotFound)?;
    Ok(Json(UserProfile::from(&user)))
}

async fn update_user(
    requester: CurrentUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserPayload>,
) -> Result<Json<UserProfile>, ApiError> {
    requester.require_admin()?;

    let mut user = state.store.find_user_by_id(id).await.ok_or(ApiError::NotFound)?;

    if let Some(name) = payload.name {
        if name.trim().is_empty() {
            return Err(ApiError::BadRequest("name must not be empty".to_string()));
        }
        user.name = name.trim().to_string();
    }
    if let Some(email) = payload.email {
        let email = email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(ApiError::BadRequest("invalid email".to_string()));
        }
        user.email = email;
    }
    if let Some(phone) = payload.phone {
        user.phone = (!phone.trim().is_empty()).then(|| phone.trim().to_string());
    }
    if let Some(role) = payload.role {
        // an admin demoting themselves would lock the dashboard out
        if user.id == requester.id && role != UserRole::Admin {
            return Err(ApiError::Conflict(
                "cannot change your own role".to_string(),
            ));
        }
        user.role = role;
    }

    let user = state.store.save_user(user).await?;
    Ok(Json(UserProfile::from(&user)))
}

async fn delete_user(
    requester: CurrentUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    requester.require_admin()?;

    if id == requester.id {
        return Err(ApiError::Conflict("cannot delete your own account".to_string()));
    }

    state.store.delete_user(id).await?;
    state.store.revoke_user_sessions(id).await;
    Ok(StatusCode::NO_CONTENT)
}

async fn activate_user(
    requester: CurrentUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserProfile>, ApiError> {
    requester.require_admin()?;

    let mut user = state.store.find_user_by_id(id).await.ok_or(ApiError::NotFound)?;
    user.is_active = true;
    user.deactivated_at = None;

    let user = state.store.save_user(user).await?;
    Ok(Json(UserProfile::from(&user)))
}

async fn deactivate_user(
    requester: CurrentUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserProfile>, ApiError> {
    requester.require_admin()?;

    if id == requester.id {
        return Err(ApiError::Conflict(
            "cannot deactivate your own account".to_string(),
        ));
    }

    let mut user = state.store.find_user_by_id(id).await.ok_or(ApiError::NotFound)?;
    user.is_active = false;
    user.deactivated_at = Some(Utc::now());

    let user = state.store.save_user(user).await?;
    // a deactivated user must not keep refreshing
    state.store.revoke_user_sessions(id).await;

    Ok(Json(UserProfile::from(&user)))
}
