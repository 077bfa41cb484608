//! HTTP API

use ads_automation::{AutomationEngine, RunRequest};
use ads_core::ExecutionSource;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<AutomationEngine>,
}

impl AppState {
    pub fn new(engine: Arc<AutomationEngine>) -> Self {
        Self { engine }
    }
}

/// Body of `POST /api/automation/run`; every field is optional
#[derive(Debug, Default, Deserialize)]
struct RunBody {
    #[serde(default)]
    owner_id: Option<String>,
    #[serde(default)]
    source: Option<ExecutionSource>,
}

/// Error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub message: String,
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/automation/run", post(run_automation))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the API server
pub async fn start_server(state: AppState, addr: &str) -> std::io::Result<()> {
    let router = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("API server listening on {}", addr);
    axum::serve(listener, router).await
}

/// GET /api/health
async fn health_check() -> &'static str {
    "OK"
}

/// POST /api/automation/run - evaluate rules now and return the report
async fn run_automation(State(state): State<AppState>, body: Bytes) -> Response {
    let body: RunBody = if body.iter().all(u8::is_ascii_whitespace) {
        RunBody::default()
    } else {
        match serde_json::from_slice(&body) {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "Rejected run request");
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse {
                        message: format!("invalid request body: {}", e),
                    }),
                )
                    .into_response();
            }
        }
    };

    let request = RunRequest {
        owner_id: body.owner_id,
        source: body.source.unwrap_or(ExecutionSource::Api),
    };
    let report = state.engine.run(request).await;

    let status = if report.success {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ads_automation::Collaborators;
    use ads_core::AutomationSettings;
    use ads_providers::{ProviderRegistry, SandboxProvider};
    use ads_store::MemoryStore;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn create_test_state() -> AppState {
        let store = Arc::new(MemoryStore::new());
        let engine = AutomationEngine::new(
            Collaborators::from_memory(store),
            ProviderRegistry::with_sandbox(SandboxProvider::new()),
            AutomationSettings::default(),
        );
        AppState::new(Arc::new(engine))
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = create_router(create_test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_run_with_empty_body() {
        let app = create_router(create_test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/automation/run")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_run_rejects_malformed_body() {
        let app = create_router(create_test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/automation/run")
                    .header("content-type", "application/json")
                    .body(Body::from("{\"owner_id\": 7"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_run_requires_post() {
        let app = create_router(create_test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/automation/run")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
