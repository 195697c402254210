use crate::domain::models::{Client, ClientStatus};
use crate::services::listing::{filter_by_query, paginate, ListParams, Paged};
use crate::state::SharedState;
use crate::web::error::ApiError;
use crate::web::session::CurrentUser;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreateClientPayload {
    pub name: String,
    pub company: String,
    pub email: String,
    pub phone: Option<String>,
    pub rating: Option<f64>,
    pub status: Option<ClientStatus>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateClientPayload {
    pub name: Option<String>,
    pub company: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub rating: Option<f64>,
    pub status: Option<ClientStatus>,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(list_clients).post(create_client))
        .route(
            "/:id",
            get(get_client).put(update_client).delete(delete_client),
        )
        .with_state(state)
}

fn check_rating(rating: f64) -> Result<f64, ApiError> {
    if !(0.0..=5.0).contains(&rating) {
        return Err(ApiError::BadRequest(
            "rating must be between 0 and 5".to_string(),
        ));
    }
    Ok(rating)
}

async fn list_clients(
    requester: CurrentUser,
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Paged<Client>>, ApiError> {
    requester.require_manager()?;

    let mut clients = state.store.list_clients().await;

    if let Some(status) = params.status.as_deref() {
        let status = ClientStatus::try_from(status)
            .map_err(|_| ApiError::BadRequest(format!("unknown status '{status}'")))?;
        clients.retain(|c| c.status == status);
    }

    clients.retain(|c| params.date_in_range(c.created_at));
    let clients = filter_by_query(clients, params.search());

    Ok(Json(paginate(clients, params.page_request())))
}

async fn get_client(
    requester: CurrentUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Client>, ApiError> {
    requester.require_manager()?;

    let client = state.store.find_client(id).await.ok_or(ApiError::NotFound)?;
    Ok(Json(client))
}

async fn create_client(
    requester: CurrentUser,
    State(state): State<SharedState>,
    Json(payload): Json<CreateClientPayload>,
) -> Result<Json<Client>, ApiError> {
    requester.require_manager()?;

    let name = payload.name.trim();
    let company = payload.company.trim();
    let email = payload.email.trim().to_lowercase();
    if name.is_empty() || company.is_empty() {
        return Err(ApiError::BadRequest(
            "name and company must not be empty".to_string(),
        ));
    }
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::BadRequest("invalid email".to_string()));
    }
    let rating = check_rating(payload.rating.unwrap_or(0.0))?;

    let client = state
        .store
        .insert_client(Client {
            id: Uuid::new_v4(),
            name: name.to_string(),
            company: company.to_string(),
            email,
            phone: payload
                .phone
                .as_deref()
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string),
            surveys_count: 0,
            rating,
            status: payload.status.unwrap_or(ClientStatus::Active),
            created_at: Utc::now(),
        })
        .await;

    Ok(Json(client))
}

async fn update_client(
    requester: CurrentUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateClientPayload>,
) -> Result<Json<Client>, ApiError> {
    requester.require_manager()?;

    let mut client = state.store.find_client(id).await.ok_or(ApiError::NotFound)?;

    if let Some(name) = payload.name {
        if name.trim().is_empty() {
            return Err(ApiError::BadRequest("name must not be empty".to_string()));
        }
        client.name = name.trim().to_string();
    }
    if let Some(company) = payload.company {
        if company.trim().is_empty() {
            return Err(ApiError::BadRequest("company must not be empty".to_string()));
        }
        client.company = company.trim().to_string();
    }
    if let Some(email) = payload.email {
        let email = email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(ApiError::BadRequest("invalid email".to_string()));
        }
        client.email = email;
    }
    if let Some(phone) = payload.phone {
        client.phone = (!phone.trim().is_empty()).then(|| phone.trim().to_string());
    }
    if let Some(rating) = payload.rating {
        client.rating = check_rating(rating)?;
    }
    if let Some(status) = payload.status {
        client.status = status;
    }

    let client = state.store.save_client(client).await?;
    Ok(Json(client))
}

async fn delete_client(
    requester: CurrentUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    requester.require_manager()?;

    state.store.delete_client(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
