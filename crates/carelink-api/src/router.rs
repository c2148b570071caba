//! Route table.

use axum::routing::get;
use axum::Router;

use crate::handlers::{health, ws};
use crate::state::AppState;

/// Builds the route table over the shared application state.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .route("/health", get(health::health))
        .route("/api/health", get(health::health))
        .with_state(state)
}
