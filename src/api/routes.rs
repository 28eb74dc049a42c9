//! Router configuration for the API server.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;
use super::AppState;

/// Create the router with every API route.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/crawl/add", post(handlers::add_sites_handler))
        .route("/crawl/fetch", get(handlers::fetch_result_handler))
        .route("/status", get(handlers::status_handler))
        .with_state(state)
}
