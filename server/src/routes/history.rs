//! Search history routes.

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use stash_engine::http::SearchHistoryBody;

use crate::auth::AuthUser;
use crate::error::Result;
use crate::handlers::{handle_get_history, handle_replace_history};
use crate::AppState;

/// Create search history routes.
pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/v1/search-history",
        get(get_history_handler).put(replace_history_handler),
    )
}

/// GET /v1/search-history
async fn get_history_handler(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<SearchHistoryBody>> {
    let body = handle_get_history(&state.pool).await?;
    Ok(Json(body))
}

/// PUT /v1/search-history
async fn replace_history_handler(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(body): Json<SearchHistoryBody>,
) -> Result<StatusCode> {
    handle_replace_history(&state.pool, body).await?;
    Ok(StatusCode::NO_CONTENT)
}
