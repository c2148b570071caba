//! Individual connection handle.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Unique connection identifier
pub type ConnectionId = Uuid;

/// A handle to a single connection.
///
/// Holds the sender side of the outbound text queue drained by the
/// transport's forwarder task, plus an aliveness flag flipped exactly once
/// on terminal close.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Unique connection ID
    pub id: ConnectionId,
    /// When the connection was established
    pub connected_at: DateTime<Utc>,
    /// Sender for serialized outbound frames
    sender: mpsc::Sender<String>,
    /// Whether the connection is still writable
    alive: AtomicBool,
}

impl ConnectionHandle {
    /// Create a new connection handle around an outbound queue.
    pub fn new(sender: mpsc::Sender<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            connected_at: Utc::now(),
            sender,
            alive: AtomicBool::new(true),
        }
    }

    /// Queue a serialized frame for delivery. Best-effort: returns `false`
    /// if the connection is closed or its queue is full, and the frame is
    /// dropped in either case.
    pub fn send(&self, frame: String) -> bool {
        if !self.is_alive() {
            return false;
        }
        match self.sender.try_send(frame) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(conn_id = %self.id, "Outbound queue full, dropping frame");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.mark_closed();
                false
            }
        }
    }

    /// Check if the connection is writable.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Mark the connection closed. Idempotent.
    pub fn mark_closed(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }
}
