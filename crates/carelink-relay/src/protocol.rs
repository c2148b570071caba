//! Protocol handler — drives the per-connection LOGIN/ACTION state machine.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use carelink_core::wire::{Frame, LoginAck, LoginRequest, RawFrame};

use crate::connection::handle::ConnectionHandle;
use crate::connection::registry::ConnectionRegistry;
use crate::router::RoomRouter;

/// Dispatches inbound frames and mutates registry state accordingly.
///
/// Every failure here is local to the offending connection: a malformed
/// frame is logged and dropped, a validation failure is answered with an
/// ERROR frame, and the connection stays open either way.
#[derive(Debug)]
pub struct ProtocolHandler {
    registry: Arc<ConnectionRegistry>,
    router: RoomRouter,
}

impl ProtocolHandler {
    /// Creates a handler over the given registry.
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        let router = RoomRouter::new(registry.clone());
        Self { registry, router }
    }

    /// Processes one raw inbound frame from a connection.
    pub fn handle_frame(&self, conn: &Arc<ConnectionHandle>, raw: &str) {
        let frame: RawFrame = match serde_json::from_str(raw) {
            Ok(f) => f,
            Err(e) => {
                warn!(conn_id = %conn.id, error = %e, "Dropping unparseable frame");
                return;
            }
        };

        match frame.kind.as_str() {
            "LOGIN" => self.handle_login(conn, frame.payload),
            "ACTION" => self.handle_action(conn, frame.payload),
            other => {
                debug!(conn_id = %conn.id, kind = %other, "Dropping frame with unrecognized type");
            }
        }
    }

    /// LOGIN: accept any non-empty username, attach identity/room to the
    /// session, acknowledge. A later LOGIN on the same connection re-runs
    /// the transition; the client uses this to switch rooms.
    fn handle_login(&self, conn: &Arc<ConnectionHandle>, payload: Value) {
        let request: LoginRequest = serde_json::from_value(payload).unwrap_or_default();

        if request.username.is_empty() {
            self.reply(conn, &Frame::Error("username required".to_string()));
            return;
        }

        let room = request
            .room
            .unwrap_or_else(|| self.registry.default_room().to_string());

        self.registry
            .update_session(conn.id, request.username.clone(), room.clone());

        self.reply(
            conn,
            &Frame::LoginSuccess(LoginAck {
                username: request.username.clone(),
                room: room.clone(),
            }),
        );

        info!(conn_id = %conn.id, username = %request.username, room = %room, "Client joined room");
    }

    /// ACTION: relay the opaque payload to the rest of the sender's room.
    /// A connection that never logged in broadcasts within the default room.
    fn handle_action(&self, conn: &Arc<ConnectionHandle>, payload: Value) {
        let session = self.registry.session_of(conn.id);
        self.router
            .broadcast(&session.room, conn.id, &Frame::Action(payload));
    }

    fn reply(&self, conn: &Arc<ConnectionHandle>, frame: &Frame) {
        match serde_json::to_string(frame) {
            Ok(text) => {
                conn.send(text);
            }
            Err(e) => warn!(conn_id = %conn.id, error = %e, "Failed to serialize reply"),
        }
    }
}
