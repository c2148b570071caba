//! Connection registry — tracks live connections and their session metadata.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use super::handle::{ConnectionHandle, ConnectionId};

/// Per-connection identity/room metadata assigned by LOGIN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Identity attached by a successful LOGIN; `None` until then.
    pub identity: Option<String>,
    /// Broadcast scope for ACTION relay.
    pub room: String,
}

#[derive(Debug)]
struct Entry {
    handle: Arc<ConnectionHandle>,
    session: Session,
}

/// Thread-safe registry of all live connections.
///
/// The registry is the only shared mutable structure in the relay. Each
/// operation is atomic per call; broadcasts iterate over a point-in-time
/// [`snapshot`](ConnectionRegistry::snapshot), never over live map state.
#[derive(Debug)]
pub struct ConnectionRegistry {
    entries: DashMap<ConnectionId, Entry>,
    default_room: String,
}

impl ConnectionRegistry {
    /// Creates an empty registry. `default_room` is assigned to connections
    /// that have not logged in.
    pub fn new(default_room: impl Into<String>) -> Self {
        Self {
            entries: DashMap::new(),
            default_room: default_room.into(),
        }
    }

    /// Registers a connection with a default, identity-less session.
    pub fn register(&self, handle: Arc<ConnectionHandle>) {
        let session = self.default_session();
        self.entries.insert(handle.id, Entry { handle, session });
    }

    /// Overwrites the session metadata for a connection.
    ///
    /// Silent no-op if the connection is unknown; that should not occur
    /// under correct use but must never take the process down.
    pub fn update_session(&self, conn_id: ConnectionId, identity: String, room: String) {
        match self.entries.get_mut(&conn_id) {
            Some(mut entry) => {
                entry.session = Session {
                    identity: Some(identity),
                    room,
                };
            }
            None => {
                debug!(conn_id = %conn_id, "Session update for unknown connection ignored");
            }
        }
    }

    /// Removes a connection and marks its handle closed. Idempotent.
    pub fn unregister(&self, conn_id: ConnectionId) {
        if let Some((_, entry)) = self.entries.remove(&conn_id) {
            entry.handle.mark_closed();
        }
    }

    /// Returns the current session for a connection, or a default
    /// room-only session if the connection is unknown.
    pub fn session_of(&self, conn_id: ConnectionId) -> Session {
        self.entries
            .get(&conn_id)
            .map(|entry| entry.session.clone())
            .unwrap_or_else(|| self.default_session())
    }

    /// Produces a point-in-time snapshot of (handle, session) pairs.
    ///
    /// A fresh snapshot must be taken for each broadcast; membership is
    /// never cached across registry mutations.
    pub fn snapshot(&self) -> Vec<(Arc<ConnectionHandle>, Session)> {
        self.entries
            .iter()
            .map(|entry| (entry.handle.clone(), entry.session.clone()))
            .collect()
    }

    /// Marks every connection closed and clears the registry.
    pub fn clear(&self) {
        for entry in self.entries.iter() {
            entry.handle.mark_closed();
        }
        self.entries.clear();
    }

    /// Returns the number of live connections.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The room assigned to connections that have not logged in.
    pub fn default_room(&self) -> &str {
        &self.default_room
    }

    fn default_session(&self) -> Session {
        Session {
            identity: None,
            room: self.default_room.clone(),
        }
    }
}
