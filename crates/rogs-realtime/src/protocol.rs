//! Phoenix channel wire format (v1 JSON serializer) and payload types.

use std::sync::atomic::{AtomicU64, Ordering};

use rogs_common::RealtimeError;
use serde::{Deserialize, Serialize};

/// Application event names carried on room channels.
pub mod events {
    /// Chat message in a room.
    pub const NEW_MESSAGE: &str = "new_message";
    pub const TYPING_START: &str = "typing_start";
    pub const TYPING_STOP: &str = "typing_stop";

    pub const OFFER: &str = "offer";
    pub const ANSWER: &str = "answer";
    pub const ICE_CANDIDATE: &str = "ice-candidate";
    /// Call intent (start/stop) from this client.
    pub const PEER_READY: &str = "peer-ready";

    /// Local lifecycle event fired on channel observers when a join is
    /// rejected, times out, or the channel errors. Never sent on the wire.
    pub const ERROR: &str = "error";
}

/// Phoenix control events.
pub mod phx {
    pub const JOIN: &str = "phx_join";
    pub const LEAVE: &str = "phx_leave";
    pub const REPLY: &str = "phx_reply";
    pub const ERROR: &str = "phx_error";
    pub const CLOSE: &str = "phx_close";
    pub const HEARTBEAT: &str = "heartbeat";
    /// Topic used for socket-level messages (heartbeats).
    pub const SOCKET_TOPIC: &str = "phoenix";
}

// ---------------------------------------------------------------------------
// Ref Counter
// ---------------------------------------------------------------------------

static REF_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Next message ref. Unique for the lifetime of the process.
pub(crate) fn next_ref() -> String {
    REF_COUNTER.fetch_add(1, Ordering::Relaxed).to_string()
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// One Phoenix frame.
///
/// `join_ref` ties channel traffic to a specific join attempt so that replies
/// and events meant for an older attempt on the same topic can be told apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhoenixMessage {
    pub topic: String,
    pub event: String,
    #[serde(default)]
    pub payload: serde_json::Value,
    #[serde(rename = "ref", default)]
    pub msg_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_ref: Option<String>,
}

impl PhoenixMessage {
    pub fn new(
        topic: impl Into<String>,
        event: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            topic: topic.into(),
            event: event.into(),
            payload,
            msg_ref: None,
            join_ref: None,
        }
    }

    pub fn with_ref(mut self, msg_ref: impl Into<String>) -> Self {
        self.msg_ref = Some(msg_ref.into());
        self
    }

    pub fn with_join_ref(mut self, join_ref: Option<String>) -> Self {
        self.join_ref = join_ref;
        self
    }

    /// `status` of a `phx_reply` payload.
    pub fn reply_status(&self) -> Option<&str> {
        self.payload.get("status").and_then(|s| s.as_str())
    }

    /// `response.reason` of an error reply, or `"unknown error"`.
    pub fn reply_reason(&self) -> String {
        self.payload
            .get("response")
            .and_then(|r| r.get("reason"))
            .and_then(|r| r.as_str())
            .unwrap_or("unknown error")
            .to_string()
    }

    pub fn encode(&self) -> Result<String, RealtimeError> {
        serde_json::to_string(self).map_err(|e| RealtimeError::Protocol(e.to_string()))
    }

    pub fn decode(text: &str) -> Result<Self, RealtimeError> {
        serde_json::from_str(text).map_err(|e| RealtimeError::Protocol(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// Direction of a call intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeerAction {
    Start,
    Stop,
}

impl std::fmt::Display for PeerAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PeerAction::Start => write!(f, "start"),
            PeerAction::Stop => write!(f, "stop"),
        }
    }
}

/// Payload of a `peer-ready` push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerReadyPayload {
    pub room_id: String,
    pub action: PeerAction,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl PeerReadyPayload {
    pub fn now(room_id: &str, action: PeerAction) -> Self {
        Self {
            room_id: room_id.to_string(),
            action,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}
