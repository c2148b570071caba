//! Wire-protocol frame definitions.
//!
//! Every frame on the wire is a JSON envelope `{type, payload}`. The relay
//! only interprets the outer envelope; ACTION payloads are application-defined
//! values it transports verbatim.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A fully-typed protocol frame.
///
/// Used for everything the server sends and everything the client sends.
/// Server-side inbound parsing goes through [`RawFrame`] first so that a
/// frame with an unrecognized `type` can be dropped without failing the
/// whole parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Frame {
    /// Login handshake from a client.
    #[serde(rename = "LOGIN")]
    Login(LoginRequest),
    /// Opaque application action, relayed to the sender's room.
    #[serde(rename = "ACTION")]
    Action(Value),
    /// Successful login acknowledgement.
    #[serde(rename = "LOGIN_SUCCESS")]
    LoginSuccess(LoginAck),
    /// Error report for the offending connection.
    #[serde(rename = "ERROR")]
    Error(String),
}

/// Partially-parsed inbound envelope: only the `type` tag is interpreted.
///
/// A missing payload deserializes to `Value::Null`, mirroring the lenient
/// handling a browser client expects.
#[derive(Debug, Clone, Deserialize)]
pub struct RawFrame {
    /// Frame kind tag.
    #[serde(rename = "type")]
    pub kind: String,
    /// Uninterpreted payload.
    #[serde(default)]
    pub payload: Value,
}

/// LOGIN payload. The password is part of the protocol shape but is never
/// validated; any non-empty username is accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Identity to attach to the connection.
    #[serde(default)]
    pub username: String,
    /// Accepted unconditionally.
    #[serde(default)]
    pub password: String,
    /// Room to join; the server's default room when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
}

/// LOGIN_SUCCESS payload echoing the applied session metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginAck {
    /// Identity now attached to the connection.
    pub username: String,
    /// Room the connection was placed in.
    pub room: String,
}
