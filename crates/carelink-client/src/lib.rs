//! # carelink-client
//!
//! Client-side session adapter for the CareLink relay. Manages the single
//! outbound WebSocket connection so the surrounding UI/state layer can
//! treat connectivity as a capability: fire-and-forget action sends, a
//! replaceable action callback, and subscribable connectivity status.

pub mod client;

pub use client::RealtimeClient;
