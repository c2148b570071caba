//! Top-level relay engine that ties the subsystems together.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tracing::info;

use carelink_core::config::relay::RelayConfig;

use crate::connection::handle::{ConnectionHandle, ConnectionId};
use crate::connection::registry::ConnectionRegistry;
use crate::protocol::ProtocolHandler;

/// Central relay engine owning the connection registry and protocol handler.
///
/// Created once at server start and passed by handle into the transport
/// layer; cleared at shutdown. Transport-agnostic: callers register a
/// connection, drain its outbound receiver, and pump inbound text frames
/// into [`handle_frame`](RelayEngine::handle_frame).
#[derive(Clone)]
pub struct RelayEngine {
    registry: Arc<ConnectionRegistry>,
    protocol: Arc<ProtocolHandler>,
    config: RelayConfig,
    shutdown_tx: broadcast::Sender<()>,
    closing: Arc<AtomicBool>,
}

impl std::fmt::Debug for RelayEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayEngine")
            .field("connections", &self.registry.len())
            .finish()
    }
}

impl RelayEngine {
    /// Creates a new relay engine.
    pub fn new(config: RelayConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        let registry = Arc::new(ConnectionRegistry::new(config.default_room.clone()));
        let protocol = Arc::new(ProtocolHandler::new(registry.clone()));

        info!(default_room = %config.default_room, "Relay engine initialized");

        Self {
            registry,
            protocol,
            config,
            shutdown_tx,
            closing: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Registers a new connection.
    ///
    /// Returns the connection handle and the receiver for its outbound
    /// frame queue, which the transport drains into the socket.
    pub fn register_connection(&self) -> (Arc<ConnectionHandle>, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(self.config.outbound_buffer_size);
        let handle = Arc::new(ConnectionHandle::new(tx));
        self.registry.register(handle.clone());

        info!(conn_id = %handle.id, "Connection registered");
        (handle, rx)
    }

    /// Processes one inbound frame from a connection.
    pub fn handle_frame(&self, conn: &Arc<ConnectionHandle>, raw: &str) {
        self.protocol.handle_frame(conn, raw);
    }

    /// Unregisters a connection after terminal close or error. Idempotent.
    pub fn disconnect(&self, conn_id: ConnectionId) {
        self.registry.unregister(conn_id);
        info!(conn_id = %conn_id, "Connection unregistered");
    }

    /// Returns the number of live connections.
    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }

    /// Whether a shutdown has been initiated.
    pub fn is_closing(&self) -> bool {
        self.closing.load(Ordering::SeqCst)
    }

    /// Returns a shutdown receiver for graceful shutdown coordination.
    pub fn shutdown_receiver(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Initiates a graceful shutdown: stops accepting upgrades and closes
    /// every live connection.
    pub async fn shutdown(&self) {
        info!("Shutting down relay engine");
        self.closing.store(true, Ordering::SeqCst);
        let _ = self.shutdown_tx.send(());
        self.registry.clear();
        info!("Relay engine shut down");
    }
}
