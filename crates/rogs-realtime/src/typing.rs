//! Debounced typing indicator.
//!
//! The first input of a burst sends `typing_start`; `typing_stop` follows once
//! no input has arrived for the idle timeout, or immediately on blur or
//! teardown. Exactly one stop is sent per start, and a start that could not
//! be sent (channel not joined yet) leaves the indicator idle.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use rogs_common::RealtimeError;
use serde_json::json;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::channel::{Channel, ChannelKind, ChannelLease, ChannelRegistry, ObserverId, PushStatus};
use crate::connection::Connection;
use crate::events::{Event, EventBus};
use crate::protocol::events;
use crate::sync::lock;

#[derive(Default)]
struct TypingState {
    is_typing: bool,
    /// Bumped whenever the idle timer is replaced or cancelled, so a timer
    /// that already fired cannot act on a newer burst.
    generation: u64,
    timer: Option<JoinHandle<()>>,
    torn_down: bool,
}

impl TypingState {
    fn cancel_timer(&mut self) {
        self.generation += 1;
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

/// Typing indicator for one room. Tears itself down when dropped.
pub struct TypingIndicator {
    lease: ChannelLease,
    idle_timeout: Duration,
    events: EventBus,
    state: Arc<Mutex<TypingState>>,
}

impl TypingIndicator {
    pub(crate) fn join(
        registry: &ChannelRegistry,
        connection: &Connection,
        room_id: &str,
    ) -> Result<Self, RealtimeError> {
        let bus = connection.events().clone();
        let lease = registry.lease(connection, ChannelKind::Typing, room_id, |lease| {
            for (event, typing) in [(events::TYPING_START, true), (events::TYPING_STOP, false)] {
                let bus = bus.clone();
                let room_id = room_id.to_string();
                lease.on(event, move |payload| {
                    bus.publish(Event::RemoteTyping {
                        room_id: room_id.clone(),
                        typing,
                        payload: payload.clone(),
                    });
                });
            }
        })?;

        Ok(Self {
            lease,
            idle_timeout: connection.config().typing_idle_timeout(),
            events: bus,
            state: Arc::new(Mutex::new(TypingState::default())),
        })
    }

    pub fn room_id(&self) -> &str {
        self.channel().room_id()
    }

    pub fn channel(&self) -> &Channel {
        self.lease.channel()
    }

    pub fn is_typing(&self) -> bool {
        lock(&self.state).is_typing
    }

    /// Record a keystroke.
    pub fn input(&self) {
        let mut state = lock(&self.state);
        if state.torn_down {
            return;
        }
        if !state.is_typing {
            if self.channel().push(events::TYPING_START, json!({})) == PushStatus::Skipped {
                debug!(room_id = %self.room_id(), "typing_start not sent; staying idle");
                return;
            }
            state.is_typing = true;
            self.publish(true);
        }
        state.cancel_timer();
        let generation = state.generation;
        state.timer = Some(self.spawn_idle_timer(generation));
    }

    /// Input lost focus: stop now if typing.
    pub fn blur(&self) {
        let mut state = lock(&self.state);
        state.cancel_timer();
        self.stop(&mut state);
    }

    /// Stop if typing, then give the channel back; it is left unless chat
    /// shares it. Idempotent.
    pub fn teardown(&self) {
        {
            let mut state = lock(&self.state);
            if state.torn_down {
                return;
            }
            state.cancel_timer();
            self.stop(&mut state);
            state.torn_down = true;
        }
        debug!(room_id = %self.room_id(), "Tearing down typing indicator");
        self.lease.release();
    }

    /// Observe typing events from other participants. The handler receives
    /// whether they started (`true`) or stopped, and the raw payload.
    pub fn on_remote_typing<F>(&self, handler: F) -> [ObserverId; 2]
    where
        F: Fn(bool, &serde_json::Value) + Send + Sync + 'static,
    {
        let handler = Arc::new(handler);
        let on_start = Arc::clone(&handler);
        [
            self.lease
                .on(events::TYPING_START, move |payload| on_start(true, payload)),
            self.lease
                .on(events::TYPING_STOP, move |payload| handler(false, payload)),
        ]
    }

    fn stop(&self, state: &mut TypingState) {
        if state.is_typing {
            state.is_typing = false;
            self.channel().push(events::TYPING_STOP, json!({}));
            self.publish(false);
        }
    }

    fn publish(&self, typing: bool) {
        self.events.publish(Event::TypingChanged {
            room_id: self.room_id().to_string(),
            typing,
        });
    }

    fn spawn_idle_timer(&self, generation: u64) -> JoinHandle<()> {
        let state = Arc::clone(&self.state);
        let channel = self.channel().clone();
        let bus = self.events.clone();
        let idle_timeout = self.idle_timeout;
        tokio::spawn(async move {
            tokio::time::sleep(idle_timeout).await;
            let mut state = lock(&state);
            if state.generation != generation || !state.is_typing {
                return;
            }
            state.is_typing = false;
            state.timer = None;
            channel.push(events::TYPING_STOP, json!({}));
            bus.publish(Event::TypingChanged {
                room_id: channel.room_id().to_string(),
                typing: false,
            });
        })
    }
}

impl Drop for TypingIndicator {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests;
