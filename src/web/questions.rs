use crate::domain::question::{Question, QuestionSettings, QuestionType};
use crate::domain::survey::SurveyStatus;
use crate::state::SharedState;
use crate::web::error::ApiError;
use crate::web::session::CurrentUser;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreateQuestionPayload {
    #[serde(default)]
    pub text: String,
    pub question_type: QuestionType,
    #[serde(default)]
    pub settings: QuestionSettings,
    #[serde(default)]
    pub required: bool,
    pub position: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuestionPayload {
    pub text: Option<String>,
    pub question_type: Option<QuestionType>,
    pub settings: Option<QuestionSettings>,
    pub required: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ReorderPayload {
    pub question_ids: Vec<Uuid>,
}

/// Routes mounted under /api/surveys/:id.
pub fn survey_scoped(state: SharedState) -> Router {
    Router::new()
        .route("/:id/questions", get(list_questions).post(create_question))
        .route("/:id/questions/reorder", post(reorder_questions))
        .with_state(state)
}

/// Routes mounted under /api/questions.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route(
            "/:id",
            get(get_question).put(update_question).delete(delete_question),
        )
        .with_state(state)
}

/// Question edits are locked once the survey is closed.
async fn editable_survey(state: &SharedState, survey_id: Uuid) -> Result<(), ApiError> {
    let survey = state
        .store
        .find_survey(survey_id)
        .await
        .ok_or(ApiError::NotFound)?;
    if survey.status == SurveyStatus::Closed {
        return Err(ApiError::Conflict(
            "closed surveys cannot be edited".to_string(),
        ));
    }
    Ok(())
}

async fn list_questions(
    _requester: CurrentUser,
    State(state): State<SharedState>,
    Path(survey_id): Path<Uuid>,
) -> Result<Json<Vec<Question>>, ApiError> {
    if state.store.find_survey(survey_id).await.is_none() {
        return Err(ApiError::NotFound);
    }
    Ok(Json(state.store.list_questions(survey_id).await))
}

async fn create_question(
    requester: CurrentUser,
    State(state): State<SharedState>,
    Path(survey_id): Path<Uuid>,
    Json(payload): Json<CreateQuestionPayload>,
) -> Result<Json<Question>, ApiError> {
    requester.require_manager()?;
    editable_survey(&state, survey_id).await?;

    let question = state
        .store
        .insert_question(Question {
            id: Uuid::new_v4(),
            survey_id,
            text: payload.text.trim().to_string(),
            question_type: payload.question_type,
            settings: payload.settings,
            position: payload.position.unwrap_or(0),
            required: payload.required,
            created_at: Utc::now(),
        })
        .await?;

    Ok(Json(question))
}

async fn get_question(
    _requester: CurrentUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Question>, ApiError> {
    let question = state.store.find_question(id).await.ok_or(ApiError::NotFound)?;
    Ok(Json(question))
}

async fn update_question(
    requester: CurrentUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateQuestionPayload>,
) -> Result<Json<Question>, ApiError> {
    requester.require_manager()?;

    let mut question = state.store.find_question(id).await.ok_or(ApiError::NotFound)?;
    editable_survey(&state, question.survey_id).await?;

    if let Some(text) = payload.text {
        question.text = text.trim().to_string();
    }
    if let Some(question_type) = payload.question_type {
        question.question_type = question_type;
    }
    if let Some(settings) = payload.settings {
        question.settings = settings;
    }
    if let Some(required) = payload.required {
        question.required = required;
    }

    let question = state.store.save_question(question).await?;
    Ok(Json(question))
}

async fn delete_question(
    requester: CurrentUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    requester.require_manager()?;

    let question = state.store.find_question(id).await.ok_or(ApiError::NotFound)?;
    editable_survey(&state, question.survey_id).await?;

    state.store.delete_question(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn reorder_questions(
    requester: CurrentUser,
    State(state): State<SharedState>,
    Path(survey_id): Path<Uuid>,
    Json(payload): Json<ReorderPayload>,
) -> Result<Json<Vec<Question>>, ApiError> {
    requester.require_manager()?;
    editable_survey(&state, survey_id).await?;

    let reordered = state
        .store
        .reorder_questions(survey_id, &payload.question_ids)
        .await?;
    Ok(Json(reordered))
}
