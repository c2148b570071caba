//! Client session adapter scenarios against real servers.

use std::time::Duration;

use futures::StreamExt;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;

use carelink_client::RealtimeClient;

use crate::helpers::{TestClient, TestServer};

#[tokio::test]
async fn login_before_open_sends_exactly_one_frame() {
    // Scripted acceptor that records every text frame it receives.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    let (frames_tx, mut frames_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let (socket, _) = listener.accept().await.expect("accept");
        let mut ws = tokio_tungstenite::accept_async(socket).await.expect("handshake");
        while let Some(Ok(msg)) = ws.next().await {
            if let Message::Text(text) = msg {
                let _ = frames_tx.send(text.as_str().to_owned());
            }
        }
    });

    let client = RealtimeClient::new();
    client.connect(&format!("ws://{addr}"));
    // Before the handshake can possibly have completed.
    client.login("alice", "pw", "demo");

    let first = timeout(Duration::from_secs(2), frames_rx.recv())
        .await
        .expect("login frame")
        .expect("acceptor alive");
    let frame: Value = serde_json::from_str(&first).expect("json");
    assert_eq!(frame["type"], "LOGIN");
    assert_eq!(frame["payload"]["username"], "alice");
    assert_eq!(frame["payload"]["room"], "demo");

    // Exactly one: nothing else follows.
    assert!(timeout(Duration::from_millis(300), frames_rx.recv())
        .await
        .is_err());

    client.disconnect();
}

#[tokio::test]
async fn status_callbacks_fire_on_connect_and_disconnect() {
    let server = TestServer::spawn().await;
    let client = RealtimeClient::new();

    let (status_tx, mut status_rx) = mpsc::unbounded_channel();
    let _unsubscribe = client.on_status_change(move |connected| {
        let _ = status_tx.send(connected);
    });

    client.connect(&server.ws_url());
    assert_eq!(
        timeout(Duration::from_secs(2), status_rx.recv()).await.expect("status"),
        Some(true)
    );
    assert!(client.is_connected());

    client.disconnect();
    assert_eq!(
        timeout(Duration::from_secs(2), status_rx.recv()).await.expect("status"),
        Some(false)
    );
    assert!(!client.is_connected());
}

#[tokio::test]
async fn adapter_relays_actions_both_ways() {
    let server = TestServer::spawn().await;

    let mut bob = TestClient::connect(&server).await;
    bob.login("bob", "demo").await;

    let client = RealtimeClient::new();
    let (action_tx, mut action_rx) = mpsc::unbounded_channel();
    client.on_action(move |payload| {
        let _ = action_tx.send(payload);
    });

    let (status_tx, mut status_rx) = mpsc::unbounded_channel();
    let _unsubscribe = client.on_status_change(move |connected| {
        let _ = status_tx.send(connected);
    });

    client.connect(&server.ws_url());
    client.login("alice", "pw", "demo");
    assert_eq!(
        timeout(Duration::from_secs(2), status_rx.recv()).await.expect("status"),
        Some(true)
    );

    // Adapter → raw peer.
    client.send_action(json!({"type": "REMINDER_ACK", "id": 7}));
    let relayed = bob.recv().await;
    assert_eq!(relayed["type"], "ACTION");
    assert_eq!(relayed["payload"]["id"], 7);

    // Raw peer → adapter.
    bob.send(json!({"type": "ACTION", "payload": {"type": "ALERT"}}))
        .await;
    let payload = timeout(Duration::from_secs(2), action_rx.recv())
        .await
        .expect("relayed action")
        .expect("callback alive");
    assert_eq!(payload["type"], "ALERT");

    client.disconnect();
}

#[tokio::test]
async fn send_action_before_connect_is_a_silent_drop() {
    let client = RealtimeClient::new();
    client.send_action(json!({"type": "PING"}));
    assert!(!client.is_connected());
}
