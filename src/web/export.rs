use crate::services::export::{
    export_clients, export_filename, export_responses, ClientRow, ExportFormat, ResponseRow,
};
use crate::state::SharedState;
use crate::web::error::ApiError;
use crate::web::session::CurrentUser;
use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    pub ids: Vec<Uuid>,
    pub format: String,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/responses", post(responses))
        .route("/clients", post(clients))
        .with_state(state)
}

fn parse_format(raw: &str) -> Result<ExportFormat, ApiError> {
    ExportFormat::try_from(raw)
        .map_err(|_| ApiError::BadRequest(format!("unsupported export format '{raw}'")))
}

fn attachment_headers(content_type: &'static str, filename: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Ok(value) = content_type.parse() {
        headers.insert(header::CONTENT_TYPE, value);
    }
    if let Ok(value) = format!("attachment; filename=\"{filename}\"").parse() {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    headers
}

/// Selected responses in the order the caller picked them. A missing id is
/// an error rather than a silently shorter file.
async fn responses(
    requester: CurrentUser,
    State(state): State<SharedState>,
    Json(payload): Json<ExportRequest>,
) -> Result<impl IntoResponse, ApiError> {
    requester.require_manager()?;
    let format = parse_format(&payload.format)?;

    let mut rows = Vec::with_capacity(payload.ids.len());
    for id in &payload.ids {
        let response = state.store.find_response(*id).await.ok_or(ApiError::NotFound)?;
        let survey_title = state
            .store
            .find_survey(response.survey_id)
            .await
            .map(|s| s.title)
            .unwrap_or_default();
        rows.push(ResponseRow::from_response(&response, &survey_title));
    }

    let document = export_responses(&rows, format);
    let filename = export_filename("responses", format, Utc::now());
    tracing::info!("exported {} response(s) as {}", rows.len(), format.as_str());

    Ok((
        attachment_headers(document.content_type, &filename),
        document.bytes,
    ))
}

async fn clients(
    requester: CurrentUser,
    State(state): State<SharedState>,
    Json(payload): Json<ExportRequest>,
) -> Result<impl IntoResponse, ApiError> {
    requester.require_manager()?;
    let format = parse_format(&payload.format)?;

    let mut rows = Vec::with_capacity(payload.ids.len());
    for id in &payload.ids {
        let client = state.store.find_client(*id).await.ok_or(ApiError::NotFound)?;
        rows.push(ClientRow::from(&client));
    }

    let document = export_clients(&rows, format);
    let filename = export_filename("clients", format, Utc::now());
    tracing::info!("exported {} client(s) as {}", rows.len(), format.as_str());

    Ok((
        attachment_headers(document.content_type, &filename),
        document.bytes,
    ))
}
