//! # carelink-api
//!
//! Axum HTTP/WebSocket surface for the CareLink relay: the `/ws` upgrade
//! endpoint, the health probe, and the server runner.

pub mod app;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use app::{build_app, run_server};
pub use state::AppState;
