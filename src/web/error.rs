use crate::domain::publish::PublishRejection;
use crate::store::StoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Handler-level error. Every variant renders a JSON body so API consumers
/// always get a machine-readable shape, never a bare status line.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("validation failed")]
    Invalid { message: String, details: Vec<String> },
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("not found")]
    NotFound,
    #[error("{0}")]
    Conflict(String),
    #[error("too many requests")]
    RateLimited,
    #[error("survey failed publish validation")]
    PublishRejected(PublishRejection),
    #[error("internal error")]
    Internal,
}

impl ApiError {
    /// Logs the real cause and hides it behind an opaque 500.
    pub fn internal<E: std::fmt::Display>(context: &'static str, err: E) -> Self {
        tracing::error!("{context}: {err}");
        ApiError::Internal
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ApiError::NotFound,
            StoreError::Conflict(message) => ApiError::Conflict(message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, json!({ "error": message }))
            }
            ApiError::Invalid { message, details } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": message, "details": details }),
            ),
            ApiError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, json!({ "error": "unauthorized" }))
            }
            ApiError::Forbidden => (StatusCode::FORBIDDEN, json!({ "error": "forbidden" })),
            ApiError::NotFound => (StatusCode::NOT_FOUND, json!({ "error": "not found" })),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, json!({ "error": message })),
            ApiError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                json!({ "error": "too many requests, try again later" }),
            ),
            ApiError::PublishRejected(rejection) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({
                    "error": rejection.consolidated_message(),
                    "survey_errors": rejection.survey_errors,
                    "question_errors": rejection.question_errors,
                }),
            ),
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "internal error" }),
            ),
        };

        (status, Json(body)).into_response()
    }
}
