use crate::domain::publish::validate_for_publish;
use crate::domain::survey::{DurationPolicy, Survey, SurveyStatus, SurveyType};
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
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreateSurveyPayload {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub survey_type: SurveyType,
    #[serde(default)]
    pub duration: DurationPolicy,
    pub client_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSurveyPayload {
    pub title: Option<String>,
    pub description: Option<String>,
    pub survey_type: Option<SurveyType>,
    pub duration: Option<DurationPolicy>,
    pub client_name: Option<String>,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(list_surveys).post(create_survey))
        .route(
            "/:id",
            get(get_survey).put(update_survey).delete(delete_survey),
        )
        .route("/:id/publish", post(publish_survey))
        .route("/:id/pause", post(pause_survey))
        .route("/:id/resume", post(resume_survey))
        .route("/:id/close", post(close_survey))
        .route("/:id/duplicate", post(duplicate_survey))
        .with_state(state)
}

fn check_duration(duration: &DurationPolicy) -> Result<(), ApiError> {
    if !duration.is_valid() {
        return Err(ApiError::BadRequest(
            "survey end date is before its start date".to_string(),
        ));
    }
    Ok(())
}

async fn list_surveys(
    _requester: CurrentUser,
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Paged<Survey>>, ApiError> {
    let mut surveys = state.store.list_surveys().await;

    if let Some(status) = params.status.as_deref() {
        let status = SurveyStatus::try_from(status)
            .map_err(|_| ApiError::BadRequest(format!("unknown status '{status}'")))?;
        surveys.retain(|s| s.status == status);
    }

    surveys.retain(|s| params.date_in_range(s.created_at));
    let surveys = filter_by_query(surveys, params.search());

    Ok(Json(paginate(surveys, params.page_request())))
}

async fn get_survey(
    _requester: CurrentUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Survey>, ApiError> {
    let survey = state.store.find_survey(id).await.ok_or(ApiError::NotFound)?;
    Ok(Json(survey))
}

/// New surveys start in draft; publish validation is the gate that cares
/// about titles and client names, so drafts may be saved incomplete.
async fn create_survey(
    requester: CurrentUser,
    State(state): State<SharedState>,
    Json(payload): Json<CreateSurveyPayload>,
) -> Result<Json<Survey>, ApiError> {
    requester.require_manager()?;
    check_duration(&payload.duration)?;

    let now = Utc::now();
    let survey = state
        .store
        .insert_survey(Survey {
            id: Uuid::new_v4(),
            title: payload.title.trim().to_string(),
            description: payload.description.trim().to_string(),
            survey_type: payload.survey_type,
            status: SurveyStatus::Draft,
            duration: payload.duration,
            client_name: payload
                .client_name
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
            owner_id: requester.id,
            responses_total: 0,
            responses_completed: 0,
            created_at: now,
            updated_at: now,
        })
        .await;

    Ok(Json(survey))
}

async fn update_survey(
    requester: CurrentUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSurveyPayload>,
) -> Result<Json<Survey>, ApiError> {
    requester.require_manager()?;

    let mut survey = state.store.find_survey(id).await.ok_or(ApiError::NotFound)?;
    if survey.status == SurveyStatus::Closed {
        return Err(ApiError::Conflict("closed surveys cannot be edited".to_string()));
    }

    if let Some(title) = payload.title {
        survey.title = title.trim().to_string();
    }
    if let Some(description) = payload.description {
        survey.description = description.trim().to_string();
    }
    if let Some(survey_type) = payload.survey_type {
        survey.survey_type = survey_type;
    }
    if let Some(duration) = payload.duration {
        check_duration(&duration)?;
        survey.duration = duration;
    }
    if let Some(client_name) = payload.client_name {
        let trimmed = client_name.trim();
        survey.client_name = (!trimmed.is_empty()).then(|| trimmed.to_string());
    }
    survey.updated_at = Utc::now();

    let survey = state.store.save_survey(survey).await?;
    Ok(Json(survey))
}

async fn delete_survey(
    requester: CurrentUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    requester.require_manager()?;

    state.store.delete_survey(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// draft -> active, guarded by the full validation report. Every problem is
/// collected before rejecting so the editor can fix them in one pass.
async fn publish_survey(
    requester: CurrentUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Survey>, ApiError> {
    requester.require_manager()?;

    let survey = state.store.find_survey(id).await.ok_or(ApiError::NotFound)?;
    if survey.status != SurveyStatus::Draft {
        return Err(ApiError::Conflict(format!(
            "only draft surveys can be published, this one is {}",
            survey.status.as_str()
        )));
    }

    let questions = state.store.list_questions(id).await;
    if let Err(rejection) = validate_for_publish(&survey, &questions) {
        tracing::info!(
            "publish blocked for survey {}: {} issue(s)",
            survey.id,
            rejection.error_count()
        );
        return Err(ApiError::PublishRejected(rejection));
    }

    let survey = state
        .store
        .transition_survey(id, SurveyStatus::Active, Utc::now())
        .await?;
    tracing::info!("survey {} published", survey.id);
    Ok(Json(survey))
}

async fn pause_survey(
    requester: CurrentUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Survey>, ApiError> {
    requester.require_manager()?;

    let survey = state
        .store
        .transition_survey(id, SurveyStatus::Paused, Utc::now())
        .await?;
    Ok(Json(survey))
}

async fn resume_survey(
    requester: CurrentUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Survey>, ApiError> {
    requester.require_manager()?;

    let survey = state.store.find_survey(id).await.ok_or(ApiError::NotFound)?;
    if survey.status != SurveyStatus::Paused {
        return Err(ApiError::Conflict(format!(
            "only paused surveys can be resumed, this one is {}",
            survey.status.as_str()
        )));
    }

    let survey = state
        .store
        .transition_survey(id, SurveyStatus::Active, Utc::now())
        .await?;
    Ok(Json(survey))
}

async fn close_survey(
    requester: CurrentUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Survey>, ApiError> {
    requester.require_manager()?;

    let survey = state
        .store
        .transition_survey(id, SurveyStatus::Closed, Utc::now())
        .await?;
    Ok(Json(survey))
}

async fn duplicate_survey(
    requester: CurrentUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Survey>, ApiError> {
    requester.require_manager()?;

    let survey = state.store.duplicate_survey(id, Utc::now()).await?;
    Ok(Json(survey))
}
