//! Record collection routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use stash_engine::http::RecordsBody;

use crate::auth::AuthUser;
use crate::error::Result;
use crate::handlers::{handle_delete, handle_list, handle_replace};
use crate::AppState;

/// Create record routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/records", get(list_handler).put(replace_handler))
        .route("/v1/records/{id}", delete(delete_handler))
}

/// GET /v1/records - Fetch the whole collection.
async fn list_handler(State(state): State<AppState>, _auth: AuthUser) -> Result<Json<RecordsBody>> {
    let body = handle_list(&state.pool).await?;
    Ok(Json(body))
}

/// PUT /v1/records - Replace the whole collection.
async fn replace_handler(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(body): Json<RecordsBody>,
) -> Result<StatusCode> {
    handle_replace(&state.pool, body).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /v1/records/{id} - Delete one record.
async fn delete_handler(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    handle_delete(&state.pool, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
