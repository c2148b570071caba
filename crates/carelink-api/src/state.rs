//! Application state shared across all handlers.

use std::sync::Arc;

use carelink_core::config::AppConfig;
use carelink_relay::RelayEngine;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Relay engine
    pub engine: Arc<RelayEngine>,
}

impl AppState {
    /// Builds application state from configuration, creating the engine.
    pub fn new(config: AppConfig) -> Self {
        let engine = Arc::new(RelayEngine::new(config.relay.clone()));
        Self {
            config: Arc::new(config),
            engine,
        }
    }
}
