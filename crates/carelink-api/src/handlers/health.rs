//! Health check handler.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Liveness probe body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `true` while the process is serving.
    pub ok: bool,
    /// Crate version.
    pub version: String,
    /// Number of live relay connections.
    pub connections: usize,
}

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        connections: state.engine.connection_count(),
    })
}
