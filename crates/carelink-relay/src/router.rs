//! Room router — delivers a frame to every other member of a room.

use std::sync::Arc;

use tracing::{debug, error};

use carelink_core::wire::Frame;

use crate::connection::handle::ConnectionId;
use crate::connection::registry::ConnectionRegistry;

/// Routes frames to room members, excluding the sender.
///
/// Room membership is recomputed from a fresh registry snapshot on every
/// broadcast; a room with zero members is simply a no-op target.
#[derive(Debug, Clone)]
pub struct RoomRouter {
    registry: Arc<ConnectionRegistry>,
}

impl RoomRouter {
    /// Creates a router over the given registry.
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Broadcasts `frame` to every open connection whose session room
    /// matches `room`, excluding `sender`.
    ///
    /// At-most-once, best-effort: connections found closed or with a full
    /// queue are skipped, not retried, and left for the close handler to
    /// reap. No buffering for absent members.
    pub fn broadcast(&self, room: &str, sender: ConnectionId, frame: &Frame) {
        let text = match serde_json::to_string(frame) {
            Ok(t) => t,
            Err(e) => {
                error!(error = %e, "Failed to serialize broadcast frame");
                return;
            }
        };

        let mut delivered = 0usize;
        for (handle, session) in self.registry.snapshot() {
            if handle.id == sender || session.room != room || !handle.is_alive() {
                continue;
            }
            if handle.send(text.clone()) {
                delivered += 1;
            }
        }

        debug!(room = %room, delivered, "Relayed frame to room");
    }
}
