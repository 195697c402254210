pub mod auth;
pub mod clients;
pub mod dashboard;
pub mod error;
pub mod export;
pub mod guard;
pub mod questions;
pub mod responses;
pub mod session;
pub mod surveys;
pub mod users;

use crate::state::SharedState;
use axum::{routing::get, Router};

async fn health() -> &'static str {
    "OK"
}

pub fn routes(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/auth", auth::router(state.clone()))
        .nest(
            "/api/surveys",
            surveys::router(state.clone())
                .merge(questions::survey_scoped(state.clone()))
                .merge(responses::survey_scoped(state.clone())),
        )
        .nest("/api/questions", questions::router(state.clone()))
        .nest("/api/responses", responses::router(state.clone()))
        .nest("/api/users", users::router(state.clone()))
        .nest("/api/clients", clients::router(state.clone()))
        .nest("/api/dashboard", dashboard::router(state.clone()))
        .nest("/api/export", export::router(state.clone()))
        .merge(guard::router(state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::domain::models::{User, UserRole};
    use crate::state::AppState;
    use crate::store::Store;
    use argon2::{
        password_hash::{PasswordHasher, SaltString},
        Argon2,
    };
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use chrono::Utc;
    use rand_core::OsRng;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;
    use uuid::Uuid;

    fn test_user(email: &str, role: UserRole, password: &str) -> User {
        let salt = SaltString::generate(OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .unwrap()
            .to_string();
        User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            name: email.split('@').next().unwrap().to_string(),
            phone: None,
            role,
            hash,
            is_active: true,
            created_at: Utc::now(),
            deactivated_at: None,
        }
    }

    async fn test_app() -> Router {
        let store = Store::new();
        store
            .insert_user(test_user("admin@surveylab.dev", UserRole::Admin, "admin-pass"))
            .await
            .unwrap();
        store
            .insert_user(test_user(
                "employee@surveylab.dev",
                UserRole::Employee,
                "employee-pass",
            ))
            .await
            .unwrap();
        routes(Arc::new(AppState::new(store, Config::for_tests())))
    }

    fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    /// Logs in and returns (access_token, refresh_token).
    async fn login(app: &Router, email: &str, password: &str) -> (String, String) {
        let (status, body) = send(
            app,
            json_request(
                "POST",
                "/api/auth/login",
                None,
                json!({ "email": email, "password": password }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        (
            body["access_token"].as_str().unwrap().to_string(),
            body["refresh_token"].as_str().unwrap().to_string(),
        )
    }

    async fn create_survey(app: &Router, token: &str, body: Value) -> Value {
        let (status, survey) =
            send(app, json_request("POST", "/api/surveys", Some(token), body)).await;
        assert_eq!(status, StatusCode::OK);
        survey
    }

    async fn add_question(app: &Router, token: &str, survey_id: &str, body: Value) {
        let (status, _) = send(
            app,
            json_request(
                "POST",
                &format!("/api/surveys/{survey_id}/questions"),
                Some(token),
                body,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health() {
        let app = test_app().await;
        let response = app
            .oneshot(get_request("/health", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_login_me_and_bad_password() {
        let app = test_app().await;
        let (access, _) = login(&app, "admin@surveylab.dev", "admin-pass").await;

        let (status, body) = send(&app, get_request("/api/auth/me", Some(&access))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "admin@surveylab.dev");
        assert_eq!(body["role"], "ADMIN");

        let (status, _) = send(
            &app,
            json_request(
                "POST",
                "/api/auth/login",
                None,
                json!({ "email": "admin@surveylab.dev", "password": "wrong" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_external_survey_without_client_fails_publish_with_one_error() {
        let app = test_app().await;
        let (token, _) = login(&app, "admin@surveylab.dev", "admin-pass").await;

        let survey = create_survey(
            &app,
            &token,
            json!({
                "title": "Customer pulse",
                "survey_type": "external",
                "client_name": ""
            }),
        )
        .await;
        let id = survey["id"].as_str().unwrap().to_string();
        add_question(
            &app,
            &token,
            &id,
            json!({ "text": "How did onboarding go?", "question_type": "text" }),
        )
        .await;

        let (status, body) = send(
            &app,
            json_request("POST", &format!("/api/surveys/{id}/publish"), Some(&token), json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let survey_errors = body["survey_errors"].as_array().unwrap();
        assert_eq!(survey_errors.len(), 1);
        assert!(survey_errors[0].as_str().unwrap().contains("client name"));
        assert!(body["question_errors"].as_array().unwrap().is_empty());

        // the survey did not move out of draft
        let (_, reloaded) = send(&app, get_request(&format!("/api/surveys/{id}"), Some(&token))).await;
        assert_eq!(reloaded["status"], "draft");
    }

    #[tokio::test]
    async fn test_publish_collects_every_error() {
        let app = test_app().await;
        let (token, _) = login(&app, "admin@surveylab.dev", "admin-pass").await;

        let survey = create_survey(
            &app,
            &token,
            json!({ "title": "", "survey_type": "external" }),
        )
        .await;
        let id = survey["id"].as_str().unwrap().to_string();
        add_question(
            &app,
            &token,
            &id,
            json!({
                "text": "Pick one",
                "question_type": "single_choice",
                "settings": { "choices": ["only"] }
            }),
        )
        .await;

        let (status, body) = send(
            &app,
            json_request("POST", &format!("/api/surveys/{id}/publish"), Some(&token), json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        // empty title + missing client name, plus the under-optioned question
        assert_eq!(body["survey_errors"].as_array().unwrap().len(), 2);
        let question_errors = body["question_errors"].as_array().unwrap();
        assert_eq!(question_errors.len(), 1);
        assert_eq!(question_errors[0]["question_index"], 1);
    }

    #[tokio::test]
    async fn test_survey_lifecycle_transitions() {
        let app = test_app().await;
        let (token, _) = login(&app, "admin@surveylab.dev", "admin-pass").await;

        let survey = create_survey(
            &app,
            &token,
            json!({ "title": "Team health", "survey_type": "internal" }),
        )
        .await;
        let id = survey["id"].as_str().unwrap().to_string();
        add_question(&app, &token, &id, json!({ "text": "Mood?", "question_type": "text" })).await;

        let publish = format!("/api/surveys/{id}/publish");
        let (status, body) = send(&app, json_request("POST", &publish, Some(&token), json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "active");

        let (status, body) = send(
            &app,
            json_request("POST", &format!("/api/surveys/{id}/pause"), Some(&token), json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "paused");

        let (status, body) = send(
            &app,
            json_request("POST", &format!("/api/surveys/{id}/resume"), Some(&token), json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "active");

        let (status, body) = send(
            &app,
            json_request("POST", &format!("/api/surveys/{id}/close"), Some(&token), json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "closed");

        // closed is terminal
        let (status, _) = send(
            &app,
            json_request("POST", &format!("/api/surveys/{id}/resume"), Some(&token), json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_submit_response_updates_counters_and_validates() {
        let app = test_app().await;
        let (token, _) = login(&app, "admin@surveylab.dev", "admin-pass").await;

        let survey = create_survey(
            &app,
            &token,
            json!({ "title": "Pulse", "survey_type": "internal" }),
        )
        .await;
        let id = survey["id"].as_str().unwrap().to_string();
        add_question(
            &app,
            &token,
            &id,
            json!({
                "text": "Rate the week",
                "question_type": "rating",
                "required": true,
                "settings": { "scale_min": 1, "scale_max": 10 }
            }),
        )
        .await;
        let (_, questions) = send(
            &app,
            get_request(&format!("/api/surveys/{id}/questions"), Some(&token)),
        )
        .await;
        let question_id = questions[0]["id"].as_str().unwrap().to_string();

        send(
            &app,
            json_request("POST", &format!("/api/surveys/{id}/publish"), Some(&token), json!({})),
        )
        .await;

        // unauthenticated submission succeeds on an active survey
        let (status, _) = send(
            &app,
            json_request(
                "POST",
                &format!("/api/surveys/{id}/responses"),
                None,
                json!({
                    "respondent": { "name": "Olena", "anonymous": false },
                    "answers": [
                        { "question_id": question_id, "value": { "type": "number", "value": 8.0 } }
                    ]
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (_, reloaded) = send(&app, get_request(&format!("/api/surveys/{id}"), Some(&token))).await;
        assert_eq!(reloaded["responses_total"], 1);
        assert_eq!(reloaded["responses_completed"], 1);

        // wrong payload kind is a consolidated validation error
        let (status, body) = send(
            &app,
            json_request(
                "POST",
                &format!("/api/surveys/{id}/responses"),
                None,
                json!({
                    "answers": [
                        { "question_id": question_id, "value": { "type": "text", "value": "eight" } }
                    ]
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(!body["details"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_client_list_pagination_meta() {
        let app = test_app().await;
        let (token, _) = login(&app, "admin@surveylab.dev", "admin-pass").await;

        for i in 0..3 {
            let (status, _) = send(
                &app,
                json_request(
                    "POST",
                    "/api/clients",
                    Some(&token),
                    json!({
                        "name": format!("Client {i}"),
                        "company": "Acme",
                        "email": format!("client{i}@acme.ua")
                    }),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, body) = send(&app, get_request("/api/clients?limit=2&page=1", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 2);
        assert_eq!(body["meta"]["total"], 3);
        assert_eq!(body["meta"]["total_pages"], 2);

        // beyond the last page: empty data, same totals
        let (status, body) = send(&app, get_request("/api/clients?limit=2&page=9", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"].as_array().unwrap().is_empty());
        assert_eq!(body["meta"]["total"], 3);

        // invalid paging values fall back to defaults
        let (status, body) = send(
            &app,
            get_request("/api/clients?limit=-1&page=0", Some(&token)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["meta"]["page"], 1);
        assert_eq!(body["meta"]["limit"], 20);
    }

    #[tokio::test]
    async fn test_refresh_rotation_replays_within_grace() {
        let app = test_app().await;
        let (_, refresh) = login(&app, "admin@surveylab.dev", "admin-pass").await;

        let (status, first) = send(
            &app,
            json_request("POST", "/api/auth/refresh", None, json!({ "refresh_token": refresh })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        // a concurrent caller still holding the old token gets the same pair
        let (status, second) = send(
            &app,
            json_request("POST", "/api/auth/refresh", None, json!({ "refresh_token": refresh })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["access_token"], second["access_token"]);
        assert_eq!(first["refresh_token"], second["refresh_token"]);

        // the rotated token keeps working
        let (status, _) = send(
            &app,
            json_request(
                "POST",
                "/api/auth/refresh",
                None,
                json!({ "refresh_token": first["refresh_token"] }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        // garbage tokens are rejected
        let (status, _) = send(
            &app,
            json_request("POST", "/api/auth/refresh", None, json!({ "refresh_token": "nope" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_page_guard_redirects() {
        let app = test_app().await;

        // unauthenticated -> login
        let response = app.clone().oneshot(get_request("/admin", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/login");

        // employee asking for the admin area lands on /employee
        let (employee, _) = login(&app, "employee@surveylab.dev", "employee-pass").await;
        let response = app
            .clone()
            .oneshot(get_request("/admin", Some(&employee)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/employee");

        // admin renders the admin area
        let (admin, _) = login(&app, "admin@surveylab.dev", "admin-pass").await;
        let response = app
            .clone()
            .oneshot(get_request("/admin", Some(&admin)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // root routes by role
        let response = app
            .clone()
            .oneshot(get_request("/", Some(&employee)))
            .await
            .unwrap();
        assert_eq!(response.headers()[header::LOCATION], "/employee");
    }

    #[tokio::test]
    async fn test_export_clients_csv() {
        let app = test_app().await;
        let (token, _) = login(&app, "admin@surveylab.dev", "admin-pass").await;

        let (_, client) = send(
            &app,
            json_request(
                "POST",
                "/api/clients",
                Some(&token),
                json!({
                    "name": "Iryna Kovalenko",
                    "company": "Acme Holding, LLC",
                    "email": "iryna@acme.ua",
                    "rating": 4.5
                }),
            ),
        )
        .await;
        let client_id = client["id"].as_str().unwrap().to_string();

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/export/clients",
                Some(&token),
                json!({ "ids": [client_id], "format": "csv" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/csv; charset=utf-8"
        );
        let disposition = response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.starts_with("attachment; filename=\"clients_"));

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert_eq!(text.lines().count(), 2); // header + 1 record
        assert!(text.contains("\"Acme Holding, LLC\""));

        // employees may not export
        let (employee, _) = login(&app, "employee@surveylab.dev", "employee-pass").await;
        let (status, _) = send(
            &app,
            json_request(
                "POST",
                "/api/export/clients",
                Some(&employee),
                json!({ "ids": [], "format": "csv" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_user_management_is_admin_only() {
        let app = test_app().await;
        let (employee, _) = login(&app, "employee@surveylab.dev", "employee-pass").await;

        let (status, _) = send(&app, get_request("/api/users", Some(&employee))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(&app, get_request("/api/users", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_dashboard_stats_shape() {
        let app = test_app().await;
        let (token, _) = login(&app, "admin@surveylab.dev", "admin-pass").await;

        let (status, body) = send(&app, get_request("/api/dashboard/stats", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["surveys"]["total"], 0);
        assert_eq!(body["responses"]["completion_rate"], 0.0);
        assert_eq!(body["users_active"], 2);
    }
}
