use serde::Serialize;
use tokio::sync::broadcast;

use crate::channel::{ChannelKind, JoinState};
use crate::connection::ConnectionState;
use crate::signaling::CallControls;

/// State changes published for observers outside the channel layer (UI, CLI).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    ConnectionStateChanged {
        session_id: String,
        state: ConnectionState,
    },
    ChannelStateChanged {
        topic: String,
        kind: ChannelKind,
        room_id: String,
        state: JoinState,
    },
    /// Local typing state for a room.
    TypingChanged { room_id: String, typing: bool },
    /// Typing event received from another participant.
    RemoteTyping {
        room_id: String,
        typing: bool,
        payload: serde_json::Value,
    },
    CallStateChanged {
        room_id: String,
        controls: CallControls,
    },
}

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Event>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: Event) -> usize {
        self.sender.send(event).unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
