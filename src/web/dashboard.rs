use crate::domain::models::ClientStatus;
use crate::domain::survey::SurveyStatus;
use crate::state::SharedState;
use crate::web::error::ApiError;
use crate::web::session::CurrentUser;
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct SurveyCounters {
    pub total: usize,
    pub draft: usize,
    pub active: usize,
    pub paused: usize,
    pub closed: usize,
}

#[derive(Debug, Serialize)]
pub struct ResponseCounters {
    pub total: i64,
    pub completed: i64,
    /// Percentage with one decimal, 0.0 when there are no responses.
    pub completion_rate: f64,
}

/// Per-survey progress line for the dashboard's active list.
#[derive(Debug, Serialize)]
pub struct SurveyProgress {
    pub id: uuid::Uuid,
    pub title: String,
    pub responses_total: i64,
    pub completion_rate: f64,
}

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub surveys: SurveyCounters,
    pub responses: ResponseCounters,
    pub active_surveys: Vec<SurveyProgress>,
    pub clients_total: usize,
    pub clients_active: usize,
    pub users_active: usize,
}

pub fn router(state: SharedState) -> Router {
    Router::new().route("/stats", get(stats)).with_state(state)
}

async fn stats(
    _requester: CurrentUser,
    State(state): State<SharedState>,
) -> Result<Json<DashboardStats>, ApiError> {
    let surveys = state.store.list_surveys().await;
    let clients = state.store.list_clients().await;
    let users = state.store.list_users().await;

    let count_status = |status: SurveyStatus| surveys.iter().filter(|s| s.status == status).count();

    let total: i64 = surveys.iter().map(|s| s.responses_total).sum();
    let completed: i64 = surveys.iter().map(|s| s.responses_completed).sum();
    let completion_rate = if total > 0 {
        ((completed as f64 / total as f64) * 1000.0).round() / 10.0
    } else {
        0.0
    };

    let active_surveys: Vec<SurveyProgress> = surveys
        .iter()
        .filter(|s| s.status == SurveyStatus::Active)
        .map(|s| SurveyProgress {
            id: s.id,
            title: s.title.clone(),
            responses_total: s.responses_total,
            completion_rate: s.completion_rate(),
        })
        .collect();

    Ok(Json(DashboardStats {
        surveys: SurveyCounters {
            total: surveys.len(),
            draft: count_status(SurveyStatus::Draft),
            active: count_status(SurveyStatus::Active),
            paused: count_status(SurveyStatus::Paused),
            closed: count_status(SurveyStatus::Closed),
        },
        responses: ResponseCounters {
            total,
            completed,
            completion_rate,
        },
        active_surveys,
        clients_total: clients.len(),
        clients_active: clients
            .iter()
            .filter(|c| c.status == ClientStatus::Active)
            .count(),
        users_active: users.iter().filter(|u| u.is_active).count(),
    }))
}
