//! End-to-end relay scenarios over real WebSocket connections.

use std::time::Duration;

use serde_json::json;

use crate::helpers::{TestClient, TestServer};

#[tokio::test]
async fn action_reaches_roommate_but_never_the_sender() {
    let server = TestServer::spawn().await;

    let mut alice = TestClient::connect(&server).await;
    let ack = alice.login("alice", "demo").await;
    assert_eq!(ack["type"], "LOGIN_SUCCESS");
    assert_eq!(ack["payload"]["username"], "alice");
    assert_eq!(ack["payload"]["room"], "demo");

    let mut bob = TestClient::connect(&server).await;
    bob.login("bob", "demo").await;

    alice
        .send(json!({"type": "ACTION", "payload": {"type": "PING"}}))
        .await;

    let relayed = bob.recv().await;
    assert_eq!(relayed["type"], "ACTION");
    assert_eq!(relayed["payload"], json!({"type": "PING"}));

    alice.expect_silence(Duration::from_millis(300)).await;
}

#[tokio::test]
async fn action_stays_within_the_room() {
    let server = TestServer::spawn().await;

    let mut alice = TestClient::connect(&server).await;
    alice.login("alice", "demo").await;
    let mut bob = TestClient::connect(&server).await;
    bob.login("bob", "demo").await;
    let mut zoe = TestClient::connect(&server).await;
    zoe.login("zoe", "other").await;

    alice
        .send(json!({"type": "ACTION", "payload": {"type": "REMINDER_DONE", "id": 3}}))
        .await;

    // Delivery to the roommate proves the broadcast ran before we assert
    // silence for the other room.
    let relayed = bob.recv().await;
    assert_eq!(relayed["payload"]["id"], 3);

    zoe.expect_silence(Duration::from_millis(300)).await;
}

#[tokio::test]
async fn departed_member_does_not_break_the_room() {
    let server = TestServer::spawn().await;

    let mut alice = TestClient::connect(&server).await;
    alice.login("alice", "demo").await;
    let mut bob = TestClient::connect(&server).await;
    bob.login("bob", "demo").await;
    let mut carol = TestClient::connect(&server).await;
    carol.login("carol", "demo").await;

    carol.close().await;
    server.wait_for_connections(2).await;

    bob.send(json!({"type": "ACTION", "payload": {"type": "ALERT"}}))
        .await;

    let relayed = alice.recv().await;
    assert_eq!(relayed["payload"]["type"], "ALERT");
    assert_eq!(server.engine.connection_count(), 2);
}

#[tokio::test]
async fn login_without_username_gets_error_frame() {
    let server = TestServer::spawn().await;

    let mut client = TestClient::connect(&server).await;
    client
        .send(json!({"type": "LOGIN", "payload": {"username": "", "password": "pw", "room": "demo"}}))
        .await;

    let reply = client.recv().await;
    assert_eq!(reply["type"], "ERROR");
    assert_eq!(reply["payload"], "username required");

    // The connection stays open and a proper login still works.
    let ack = client.login("late", "demo").await;
    assert_eq!(ack["type"], "LOGIN_SUCCESS");
}

#[tokio::test]
async fn relogin_moves_connection_between_rooms() {
    let server = TestServer::spawn().await;

    let mut alice = TestClient::connect(&server).await;
    alice.login("alice", "demo").await;
    let mut bob = TestClient::connect(&server).await;
    bob.login("bob", "demo").await;
    let mut carol = TestClient::connect(&server).await;
    carol.login("carol", "ward-3").await;

    let ack = alice.login("alice", "ward-3").await;
    assert_eq!(ack["payload"]["room"], "ward-3");

    alice
        .send(json!({"type": "ACTION", "payload": {"type": "PING"}}))
        .await;

    let relayed = carol.recv().await;
    assert_eq!(relayed["type"], "ACTION");
    bob.expect_silence(Duration::from_millis(300)).await;
}

#[tokio::test]
async fn shutdown_closes_live_connections_and_rejects_new_ones() {
    let server = TestServer::spawn().await;

    let mut alice = TestClient::connect(&server).await;
    alice.login("alice", "demo").await;
    let mut bob = TestClient::connect(&server).await;
    bob.login("bob", "demo").await;

    server.engine.shutdown().await;

    // Live connections observe the shutdown broadcast and close.
    alice.expect_closed().await;
    bob.expect_closed().await;
    server.wait_for_connections(0).await;

    // New upgrade attempts are rejected while closing.
    assert!(tokio_tungstenite::connect_async(server.ws_url())
        .await
        .is_err());
}

#[tokio::test]
async fn malformed_frames_do_not_close_the_connection() {
    let server = TestServer::spawn().await;

    let mut client = TestClient::connect(&server).await;
    client.send_raw("definitely not json").await;
    client
        .send(json!({"type": "TELEPORT", "payload": {}}))
        .await;

    let ack = client.login("alice", "demo").await;
    assert_eq!(ack["type"], "LOGIN_SUCCESS");
}
