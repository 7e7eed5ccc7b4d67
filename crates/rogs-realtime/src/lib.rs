//! Room-scoped realtime channels over a single Phoenix socket.
//!
//! One [`Connection`] per client multiplexes every room channel. The
//! [`ChannelRegistry`] hands out at most one live channel per topic and lets
//! at most one component hold each kind of channel for a room;
//! [`ChatChannel`], [`TypingIndicator`] and [`SignalingChannel`] are the
//! per-feature wrappers built on top of it.
//! [`RealtimeSession`] ties the pieces together for callers.

pub mod channel;
pub mod chat;
pub mod connection;
pub mod events;
pub mod protocol;
pub mod session;
pub mod signaling;
pub mod typing;

mod sync;

#[cfg(test)]
mod testing;

pub use channel::{
    Channel, ChannelKind, ChannelRegistry, JoinState, Observer, ObserverId, PushStatus, TopicNames,
};
pub use chat::{ChatChannel, ChatHooks};
pub use connection::{
    Connection, ConnectionManager, ConnectionState, ConnectionStats, Connector, RealtimeConfig,
    Transport, WebSocketConnector,
};
pub use events::{Event, EventBus};
pub use protocol::{events as channel_events, PeerAction, PeerReadyPayload, PhoenixMessage};
pub use rogs_common::RealtimeError;
pub use session::RealtimeSession;
pub use signaling::{CallControls, SignalHooks, SignalKind, SignalingChannel};
pub use typing::TypingIndicator;
