//! Application builder — wires router + middleware + state into an Axum app.

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use carelink_core::config::AppConfig;
use carelink_core::error::AppError;
use carelink_core::AppResult;

use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    build_router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Runs the CareLink relay server with the given configuration.
pub async fn run_server(config: AppConfig) -> AppResult<()> {
    let state = AppState::new(config);
    let engine = state.engine.clone();

    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::transport(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!("CareLink relay listening on {addr}");

    // The engine shuts down inside the graceful-shutdown future: closing
    // every live connection lets the drained ws tasks exit, which is what
    // allows serve to finish at all.
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            engine.shutdown().await;
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
}
