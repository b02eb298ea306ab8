//! Liveness/readiness endpoint.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use crate::state::AppState;

/// GET /health
///
/// Returns 200 with `{"status":"ok"}` when the database answers, 503
/// otherwise.
async fn health(State(state): State<AppState>) -> impl IntoResponse {
    match storyweave_db::health_check(&state.pool).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ok" }))),
        Err(err) => {
            tracing::error!(error = %err, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "degraded" })),
            )
        }
    }
}

/// Top-level health router (not nested under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
