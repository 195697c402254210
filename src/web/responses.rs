use crate::domain::response::{
    answer_issues, Answer, Respondent, ResponseStatus, SurveyResponse,
};
use crate::domain::survey::SurveyStatus;
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
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct SubmitResponsePayload {
    #[serde(default)]
    pub respondent: Respondent,
    pub status: Option<ResponseStatus>,
    pub device: Option<String>,
    pub location: Option<String>,
    #[serde(default)]
    pub answers: Vec<Answer>,
}

#[derive(Debug, Deserialize)]
pub struct BulkDeletePayload {
    pub ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct BulkDeleteResult {
    pub deleted: usize,
}

/// Routes mounted under /api/surveys/:id.
pub fn survey_scoped(state: SharedState) -> Router {
    Router::new()
        .route("/:id/responses", get(list_responses).post(submit_response))
        .with_state(state)
}

/// Routes mounted under /api/responses.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/:id", get(get_response).delete(delete_response))
        .route("/bulk-delete", post(bulk_delete))
        .with_state(state)
}

async fn list_responses(
    requester: CurrentUser,
    State(state): State<SharedState>,
    Path(survey_id): Path<Uuid>,
    Query(params): Query<ListParams>,
) -> Result<Json<Paged<SurveyResponse>>, ApiError> {
    requester.require_manager()?;

    if state.store.find_survey(survey_id).await.is_none() {
        return Err(ApiError::NotFound);
    }

    let mut responses = state.store.list_responses(survey_id).await;

    if let Some(status) = params.status.as_deref() {
        let status = ResponseStatus::try_from(status)
            .map_err(|_| ApiError::BadRequest(format!("unknown status '{status}'")))?;
        responses.retain(|r| r.status == status);
    }

    responses.retain(|r| params.date_in_range(r.started_at));
    let responses = filter_by_query(responses, params.search());

    Ok(Json(paginate(responses, params.page_request())))
}

/// Respondents are not dashboard users, so submission is unauthenticated.
/// All answer problems are collected before rejecting.
async fn submit_response(
    State(state): State<SharedState>,
    Path(survey_id): Path<Uuid>,
    Json(payload): Json<SubmitResponsePayload>,
) -> Result<(StatusCode, Json<SurveyResponse>), ApiError> {
    let survey = state
        .store
        .find_survey(survey_id)
        .await
        .ok_or(ApiError::NotFound)?;
    if survey.status != SurveyStatus::Active {
        return Err(ApiError::Conflict(format!(
            "survey is not accepting responses while {}",
            survey.status.as_str()
        )));
    }

    let questions = state.store.list_questions(survey_id).await;
    let status = payload.status.unwrap_or(ResponseStatus::Completed);

    let mut details = Vec::new();
    let mut answered: HashSet<Uuid> = HashSet::new();

    for (index, answer) in payload.answers.iter().enumerate() {
        let Some(question) = questions.iter().find(|q| q.id == answer.question_id) else {
            details.push(format!(
                "answer {}: question {} does not belong to this survey",
                index + 1,
                answer.question_id
            ));
            continue;
        };
        if !answered.insert(question.id) {
            details.push(format!(
                "question {}: answered more than once",
                question.position
            ));
            continue;
        }
        for issue in answer_issues(question, &answer.value) {
            details.push(format!("question {}: {issue}", question.position));
        }
    }

    if status == ResponseStatus::Completed {
        for question in questions.iter().filter(|q| q.required) {
            let filled = payload
                .answers
                .iter()
                .any(|a| a.question_id == question.id && !a.value.is_empty());
            if !filled {
                details.push(format!(
                    "question {}: required question is not answered",
                    question.position
                ));
            }
        }
    }

    if !details.is_empty() {
        return Err(ApiError::Invalid {
            message: "response failed validation".to_string(),
            details,
        });
    }

    let now = Utc::now();
    let response = state
        .store
        .insert_response(SurveyResponse {
            id: Uuid::new_v4(),
            survey_id,
            status,
            respondent: payload.respondent,
            started_at: now,
            completed_at: (status == ResponseStatus::Completed).then_some(now),
            device: payload.device,
            location: payload.location,
            answers: payload.answers,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(response)))
}

async fn get_response(
    requester: CurrentUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SurveyResponse>, ApiError> {
    requester.require_manager()?;

    let response = state.store.find_response(id).await.ok_or(ApiError::NotFound)?;
    Ok(Json(response))
}

async fn delete_response(
    requester: CurrentUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    requester.require_manager()?;

    state.store.delete_response(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn bulk_delete(
    requester: CurrentUser,
    State(state): State<SharedState>,
    Json(payload): Json<BulkDeletePayload>,
) -> Result<Json<BulkDeleteResult>, ApiError> {
    requester.require_manager()?;

    let deleted = state.store.bulk_delete_responses(&payload.ids).await;
    Ok(Json(BulkDeleteResult { deleted }))
}
