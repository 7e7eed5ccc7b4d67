use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::protocol::events;

/// Callback attached to a channel event. Receives the event payload.
pub type Observer = Arc<dyn Fn(&serde_json::Value) + Send + Sync>;

/// Handle returned by [`Channel::on`](super::Channel::on), used to detach the observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(pub(crate) u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    Chat,
    Typing,
    Signal,
}

impl ChannelKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ChannelKind::Chat => "chat",
            ChannelKind::Typing => "typing",
            ChannelKind::Signal => "signal",
        }
    }

    /// Application events expected from the server on this kind of channel.
    pub fn inbound_events(self) -> &'static [&'static str] {
        match self {
            ChannelKind::Chat => &[events::NEW_MESSAGE],
            ChannelKind::Typing => &[events::TYPING_START, events::TYPING_STOP],
            ChannelKind::Signal => &[events::OFFER, events::ANSWER, events::ICE_CANDIDATE],
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Join lifecycle of one channel.
///
/// `Errored` is retryable by joining again; `Left` is final for the instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinState {
    Idle,
    Joining,
    Joined,
    Errored,
    Left,
}

impl fmt::Display for JoinState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JoinState::Idle => "idle",
            JoinState::Joining => "joining",
            JoinState::Joined => "joined",
            JoinState::Errored => "errored",
            JoinState::Left => "left",
        };
        f.write_str(s)
    }
}

/// Outcome of a push. Pushes are fire-and-forget and never buffered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushStatus {
    /// Handed to the connection for writing.
    Queued,
    /// Dropped: the channel was not joined, or there was no channel.
    Skipped,
}

/// Topic prefix per channel kind. Topics are `<prefix>:<room_id>`.
///
/// Kinds that resolve to the same topic share one channel, so chat and
/// typing ride a single `room:<id>` subscription by default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicNames {
    pub chat: String,
    pub typing: String,
    pub signal: String,
}

impl Default for TopicNames {
    fn default() -> Self {
        Self {
            chat: "room".into(),
            typing: "room".into(),
            signal: "signal".into(),
        }
    }
}

impl TopicNames {
    pub fn prefix(&self, kind: ChannelKind) -> &str {
        match kind {
            ChannelKind::Chat => &self.chat,
            ChannelKind::Typing => &self.typing,
            ChannelKind::Signal => &self.signal,
        }
    }

    pub fn topic(&self, kind: ChannelKind, room_id: &str) -> String {
        format!("{}:{room_id}", self.prefix(kind))
    }
}
