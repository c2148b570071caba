//! # carelink-relay
//!
//! The relay/session core of CareLink. Provides:
//!
//! - Connection registry tracking live connections and their sessions
//! - Room router broadcasting action frames to room members
//! - Protocol handler driving the LOGIN/ACTION state machine
//!
//! The engine is transport-agnostic: each connection is represented by a
//! handle holding an outbound text queue, and the HTTP/WebSocket surface
//! pumps inbound frames into [`RelayEngine::handle_frame`].

pub mod connection;
pub mod engine;
pub mod protocol;
pub mod router;

pub use connection::handle::{ConnectionHandle, ConnectionId};
pub use connection::registry::{ConnectionRegistry, Session};
pub use engine::RelayEngine;
pub use router::RoomRouter;
