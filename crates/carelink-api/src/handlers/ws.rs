//! WebSocket upgrade handler.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tracing::{info, warn};

use carelink_core::error::AppError;

use crate::error::ApiError;
use crate::state::AppState;

/// GET /ws — WebSocket upgrade
pub async fn ws_handler(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    if state.engine.is_closing() {
        return Err(AppError::service_unavailable("relay is shutting down").into());
    }

    Ok(ws.on_upgrade(move |socket| handle_ws_connection(state, socket)))
}

/// Handles an established WebSocket connection.
async fn handle_ws_connection(state: AppState, socket: WebSocket) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    let (handle, mut outbound_rx) = state.engine.register_connection();
    let conn_id = handle.id;
    let mut shutdown_rx = state.engine.shutdown_receiver();

    info!(conn_id = %conn_id, "WebSocket connection established");

    // Forward queued outbound frames into the socket.
    let outbound_task = tokio::spawn(async move {
        while let Some(frame) = outbound_rx.recv().await {
            if ws_tx.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    // Frames from one connection are processed in receipt order. The loop
    // also ends when the engine broadcasts shutdown, so graceful shutdown
    // can drain upgraded connections.
    loop {
        tokio::select! {
            result = ws_rx.next() => match result {
                Some(Ok(Message::Text(text))) => {
                    state.engine.handle_frame(&handle, text.as_str());
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(conn_id = %conn_id, error = %e, "WebSocket error");
                    break;
                }
            },
            _ = shutdown_rx.recv() => {
                info!(conn_id = %conn_id, "Closing connection for shutdown");
                break;
            }
        }
    }

    outbound_task.abort();
    state.engine.disconnect(conn_id);

    info!(conn_id = %conn_id, "WebSocket connection closed");
}
