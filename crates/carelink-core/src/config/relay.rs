//! Relay engine configuration.

use serde::{Deserialize, Serialize};

/// Relay engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Room assigned to connections that have not logged in, and the
    /// fallback when a LOGIN omits the room.
    #[serde(default = "default_room")]
    pub default_room: String,
    /// Per-connection outbound queue capacity. A receiver whose queue is
    /// full has the frame dropped (best-effort delivery).
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer_size: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            default_room: default_room(),
            outbound_buffer_size: default_outbound_buffer(),
        }
    }
}

fn default_room() -> String {
    "demo".to_string()
}

fn default_outbound_buffer() -> usize {
    64
}
