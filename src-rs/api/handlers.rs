use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error};

use crate::error::DiagnosticError;
use crate::task::{TaskManager, TaskView};

pub type AppState = Arc<TaskManager>;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    #[serde(default, alias = "problemDescription")]
    pub problem_text: Option<String>,
    #[serde(default, alias = "systemInfoText")]
    pub raw_system_info: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub task_id: String,
    pub message: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct TasksQuery {
    pub limit: Option<usize>,
}

pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(String),
}

impl From<DiagnosticError> for ApiError {
    fn from(err: DiagnosticError) -> Self {
        match err {
            DiagnosticError::Validation(msg) => ApiError::BadRequest(msg),
            DiagnosticError::NotFound(id) => ApiError::NotFound(format!("report for task {} not found", id)),
            other => {
                error!(error = %other, "internal error while serving request");
                ApiError::Internal(other.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(json!({"error": message}))).into_response()
    }
}

pub async fn handle_health() -> Json<serde_json::Value> {
    Json(json!({"status": "ok", "version": env!("CARGO_PKG_VERSION")}))
}

pub async fn handle_submit(
    State(manager): State<AppState>,
    payload: Result<Json<SubmitRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    let Json(req) = payload.map_err(|rejection| {
        debug!(error = %rejection, "rejecting malformed submission");
        ApiError::BadRequest(rejection.body_text())
    })?;
    let task_id = manager.submit(req.problem_text.as_deref(), req.raw_system_info.as_deref())?;
    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitResponse {
            task_id,
            message: "Diagnostic data received, processing started.".to_string(),
        }),
    ))
}

/// In-flight tasks answer 202, finished ones (including failures) 200.
pub async fn handle_status(
    State(manager): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<(StatusCode, Json<TaskView>), ApiError> {
    let view = manager.status(&task_id)?;
    debug!(task_id = %task_id, status = ?view.status, "serving task status");
    let code = if view.status.is_terminal() {
        StatusCode::OK
    } else {
        StatusCode::ACCEPTED
    };
    Ok((code, Json(view)))
}

pub async fn handle_tasks(
    State(manager): State<AppState>,
    Query(query): Query<TasksQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let limit = query.limit.unwrap_or(10);
    let tasks = manager.list(limit)?;
    Ok(Json(json!({ "tasks": tasks })))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::Request;
    use axum::Router;
    use tower::ServiceExt;

    use super::*;
    use crate::analyzer::StubAnalyzer;
    use crate::api::server::build_router;
    use crate::task::{QueuedScheduler, TaskStore};

    fn test_app(analyzer: StubAnalyzer) -> (Router, Arc<QueuedScheduler>) {
        let scheduler = Arc::new(QueuedScheduler::new());
        let manager = TaskManager::new(Arc::new(TaskStore::new()), Arc::new(analyzer), scheduler.clone());
        (build_router(Arc::new(manager)), scheduler)
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (app, _) = test_app(StubAnalyzer::simulated(Duration::ZERO));
        let response = app.oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn submit_is_accepted_and_pollable() {
        let (app, scheduler) = test_app(StubAnalyzer::simulated(Duration::ZERO));

        let response = app
            .clone()
            .oneshot(post_json("/api/diagnostics", json!({"problemText": "slow boot"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let task_id = body_json(response).await["taskId"].as_str().unwrap().to_string();

        let uri = format!("/api/diagnostics/{}", task_id);
        let response = app.clone().oneshot(get(&uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let pending = body_json(response).await;
        assert_eq!(pending["status"], "PENDING");
        assert!(pending.get("report").is_none());

        scheduler.run_pending().await;

        let response = app.oneshot(get(&uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let done = body_json(response).await;
        assert_eq!(done["status"], "COMPLETED");
        assert_eq!(done["problemText"], "slow boot");
        assert!(done["report"]["summary"].is_string());
        assert!(done["completedAt"].is_string());
    }

    #[tokio::test]
    async fn legacy_field_names_are_accepted() {
        let (app, _) = test_app(StubAnalyzer::simulated(Duration::ZERO));
        let response = app
            .oneshot(post_json(
                "/api/diagnostics",
                json!({"problemDescription": "", "systemInfoText": "Host Name: pc-01"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn empty_submission_is_bad_request() {
        let (app, scheduler) = test_app(StubAnalyzer::simulated(Duration::ZERO));
        let response = app
            .oneshot(post_json("/api/diagnostics", json!({"problemText": "", "rawSystemInfo": "  "})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await["error"].is_string());
        assert_eq!(scheduler.pending(), 0);
    }

    #[tokio::test]
    async fn bodyless_submission_is_bad_request_json() {
        let (app, scheduler) = test_app(StubAnalyzer::simulated(Duration::ZERO));
        let request = Request::builder()
            .method("POST")
            .uri("/api/diagnostics")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await["error"].is_string());
        assert_eq!(scheduler.pending(), 0);
    }

    #[tokio::test]
    async fn mistyped_field_is_bad_request_json() {
        let (app, scheduler) = test_app(StubAnalyzer::simulated(Duration::ZERO));
        let response = app
            .oneshot(post_json("/api/diagnostics", json!({"problemText": 5})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await["error"].is_string());
        assert_eq!(scheduler.pending(), 0);
    }

    #[tokio::test]
    async fn failed_task_is_reported_with_ok() {
        let (app, scheduler) = test_app(StubAnalyzer::failing("backend unavailable", Duration::ZERO));
        let response = app
            .clone()
            .oneshot(post_json("/api/diagnostics", json!({"problemText": "crash"})))
            .await
            .unwrap();
        let task_id = body_json(response).await["taskId"].as_str().unwrap().to_string();
        scheduler.run_pending().await;

        let response = app.oneshot(get(&format!("/api/diagnostics/{}", task_id))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "FAILED");
        assert_eq!(body["errorMessage"], "backend unavailable");
        assert_eq!(body["report"]["confidenceScore"], 0.0);
    }

    #[tokio::test]
    async fn unknown_task_is_not_found() {
        let (app, _) = test_app(StubAnalyzer::simulated(Duration::ZERO));
        let response = app.oneshot(get("/api/diagnostics/nonexistent-id")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn tasks_listing_respects_limit() {
        let (app, _) = test_app(StubAnalyzer::simulated(Duration::ZERO));
        for text in ["one", "two", "three"] {
            app.clone()
                .oneshot(post_json("/api/diagnostics", json!({"problemText": text})))
                .await
                .unwrap();
        }

        let response = app.oneshot(get("/api/tasks?limit=2")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let tasks = body["tasks"].as_array().unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0]["problemText"], "three");
    }
}
