use std::sync::Arc;

use tokio::sync::broadcast;

use crate::channel::{ChannelKind, ChannelRegistry};
use crate::chat::{ChatChannel, ChatHooks};
use crate::connection::{
    Connection, ConnectionManager, ConnectionState, Connector, RealtimeConfig, WebSocketConnector,
};
use crate::events::{Event, EventBus};
use crate::signaling::{SignalHooks, SignalingChannel};
use crate::typing::TypingIndicator;
use crate::RealtimeError;

/// Entry point for callers: one connection plus the channel registry.
///
/// Channel joins fail with [`RealtimeError::NotInitialized`] until
/// [`connect`](Self::connect) has been called, and again once the connection
/// has been disconnected or has given up reconnecting.
pub struct RealtimeSession {
    connections: ConnectionManager,
    registry: ChannelRegistry,
    events: EventBus,
}

impl RealtimeSession {
    pub fn new(config: RealtimeConfig) -> Self {
        Self::with_connector(config, Arc::new(WebSocketConnector))
    }

    pub fn with_connector(config: RealtimeConfig, connector: Arc<dyn Connector>) -> Self {
        let events = EventBus::new(config.event_capacity);
        Self {
            connections: ConnectionManager::new(config, connector, events.clone()),
            registry: ChannelRegistry::new(),
            events,
        }
    }

    /// Open the connection, or return the live one (ignoring `auth_token`).
    pub fn connect(&self, auth_token: &str) -> Connection {
        self.connections.connect(auth_token)
    }

    /// Drop every channel and open a fresh connection with `auth_token`.
    /// Wrappers obtained earlier stay bound to the old connection.
    pub fn reconnect(&self, auth_token: &str) -> Connection {
        self.registry.release_all();
        self.connections.reconnect(auth_token)
    }

    pub async fn disconnect(&self) {
        self.registry.release_all();
        self.connections.disconnect().await;
    }

    pub fn connection(&self) -> Result<Connection, RealtimeError> {
        self.connections.current()
    }

    pub fn state(&self) -> ConnectionState {
        self.connections.state()
    }

    pub fn join_chat(&self, room_id: &str, hooks: ChatHooks) -> Result<ChatChannel, RealtimeError> {
        let connection = self.connections.current()?;
        ChatChannel::join(&self.registry, &connection, room_id, hooks)
    }

    pub fn join_typing(&self, room_id: &str) -> Result<TypingIndicator, RealtimeError> {
        let connection = self.connections.current()?;
        TypingIndicator::join(&self.registry, &connection, room_id)
    }

    pub fn join_signal(
        &self,
        room_id: &str,
        hooks: SignalHooks,
    ) -> Result<SignalingChannel, RealtimeError> {
        let connection = self.connections.current()?;
        SignalingChannel::join(&self.registry, &connection, room_id, hooks)
    }

    /// Leave and forget a channel. No-op if it does not exist.
    pub fn release(&self, kind: ChannelKind, room_id: &str) {
        self.registry.release(kind, room_id);
    }

    pub fn registry(&self) -> &ChannelRegistry {
        &self.registry
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests;
