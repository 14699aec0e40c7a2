/// Application routes configuration
use crate::handlers::{get_item, get_state, health, list_pages, search, search_next, AppState};
use axum::{routing::get, Router};

/// Build the application router with all routes
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health))
        // Search endpoints
        .route("/search", get(search))
        .route("/search/next", get(search_next))
        // Accumulated results
        .route("/state", get(get_state))
        .route("/pages", get(list_pages))
        .route("/items/:nasa_id", get(get_item))
        .with_state(state)
}
