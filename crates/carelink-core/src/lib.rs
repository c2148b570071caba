//! # carelink-core
//!
//! Core crate for the CareLink relay. Contains configuration schemas,
//! the unified error system, and the wire-protocol frame types shared by
//! the server, the HTTP/WebSocket surface, and the client adapter.
//!
//! This crate has **no** internal dependencies on other CareLink crates.

pub mod config;
pub mod error;
pub mod result;
pub mod wire;

pub use error::AppError;
pub use result::AppResult;
