//! JSON service over axum.
//!
//! Routes: `GET /health`, `POST /step`, `POST /optimize`, `POST /engine`.
//! Every error is answered with `{ "error": ... }`.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{Method, Uri};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::api::{self, ApiError, EngineBody, OptimizeBody, OptimizeResponse, StepRequest, StepResponse};
use crate::config::EngineConfig;
use crate::engine::EngineReport;

/// Largest request body accepted; larger bodies are answered with 413.
pub const MAX_REQUEST_BYTES: usize = 64 * 1024;

type Shared = State<Arc<EngineConfig>>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        warn!(status = status.as_u16(), error = %self, "request failed");
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "service": "mobius" }))
}

async fn step(
    State(config): Shared,
    payload: Result<Json<StepRequest>, JsonRejection>,
) -> Result<Json<StepResponse>, ApiError> {
    let Json(request) = payload?;
    Ok(Json(api::step(&request, &config)?))
}

async fn optimize(
    State(config): Shared,
    payload: Result<Json<OptimizeBody>, JsonRejection>,
) -> Result<Json<OptimizeResponse>, ApiError> {
    let Json(body) = payload?;
    Ok(Json(api::optimize(&body, &config)?))
}

async fn engine(
    State(config): Shared,
    payload: Result<Json<EngineBody>, JsonRejection>,
) -> Result<Json<EngineReport>, ApiError> {
    let Json(body) = payload?;
    Ok(Json(api::engine(&body, &config)?))
}

async fn not_found(method: Method, uri: Uri) -> ApiError {
    ApiError::NotFound {
        method: method.to_string(),
        path: uri.path().to_string(),
    }
}

pub fn router(config: Arc<EngineConfig>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/step", post(step))
        .route("/optimize", post(optimize))
        .route("/engine", post(engine))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(config)
}
