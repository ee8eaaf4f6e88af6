//! Health check endpoint.

use axum::{routing::get, Json, Router};
use stash_engine::http::HealthResponse;

use crate::AppState;

/// Create health routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/", get(root))
}

/// Health check handler.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Root handler.
async fn root() -> &'static str {
    "Stash Server"
}
