//! Chat messages for a room.

use std::sync::Arc;

use rogs_common::RealtimeError;

use crate::channel::{
    Channel, ChannelKind, ChannelLease, ChannelRegistry, Observer, ObserverId, PushStatus,
};
use crate::connection::Connection;
use crate::protocol::events;

/// Optional callbacks supplied when joining a chat room.
#[derive(Clone, Default)]
pub struct ChatHooks {
    pub message: Option<Observer>,
}

impl ChatHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_message<F>(mut self, handler: F) -> Self
    where
        F: Fn(&serde_json::Value) + Send + Sync + 'static,
    {
        self.message = Some(Arc::new(handler));
        self
    }
}

impl std::fmt::Debug for ChatHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatHooks")
            .field("message", &self.message.is_some())
            .finish()
    }
}

/// The chat channel of one room. Leaves when dropped.
pub struct ChatChannel {
    lease: ChannelLease,
}

impl std::fmt::Debug for ChatChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatChannel")
            .field("channel", self.lease.channel())
            .finish()
    }
}

impl ChatChannel {
    pub(crate) fn join(
        registry: &ChannelRegistry,
        connection: &Connection,
        room_id: &str,
        hooks: ChatHooks,
    ) -> Result<Self, RealtimeError> {
        let lease = registry.lease(connection, ChannelKind::Chat, room_id, |lease| {
            if let Some(handler) = hooks.message {
                lease.on_observer(events::NEW_MESSAGE, handler);
            }
        })?;
        Ok(Self { lease })
    }

    pub fn room_id(&self) -> &str {
        self.lease.channel().room_id()
    }

    pub fn channel(&self) -> &Channel {
        self.lease.channel()
    }

    /// Add another `new_message` observer.
    pub fn on_message<F>(&self, handler: F) -> ObserverId
    where
        F: Fn(&serde_json::Value) + Send + Sync + 'static,
    {
        self.lease.on(events::NEW_MESSAGE, handler)
    }

    pub fn push(&self, event: &str, payload: serde_json::Value) -> PushStatus {
        self.lease.channel().push(event, payload)
    }

    /// Send a `new_message` with the given body.
    pub fn send_message(&self, content: &str) -> PushStatus {
        self.push(events::NEW_MESSAGE, serde_json::json!({ "content": content }))
    }

    /// Stop receiving messages. The room's channel is left unless typing
    /// still rides on it. Idempotent.
    pub fn leave(&self) {
        self.lease.release();
    }
}
