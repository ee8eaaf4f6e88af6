//! Stash Server - remote record store for local-first data synchronization.
//!
//! Serves one record collection and one search history over HTTP, backed by
//! PostgreSQL. Clients push the whole collection and pull it back; conflict
//! handling happens on the client (see `stash_engine::merge`).

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod routes;

use crate::config::Config;
use crate::db::Pool;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub pool: Pool,
    pub config: Arc<Config>,
}

/// Build the application router with its middleware.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::create_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
