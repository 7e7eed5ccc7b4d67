//! A single topic subscription on the shared connection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rogs_common::RealtimeError;
use serde_json::json;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::types::{ChannelKind, JoinState, Observer, ObserverId, PushStatus};
use crate::connection::{Connection, SocketCommand};
use crate::events::{Event, EventBus};
use crate::protocol::{events, next_ref, PhoenixMessage};
use crate::sync::lock;

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

struct ChannelStatus {
    state: JoinState,
    join_ref: Option<String>,
    ever_joined: bool,
    last_error: Option<String>,
}

struct ObserverEntry {
    id: ObserverId,
    event: String,
    handler: Observer,
}

/// Channel state shared between the public handle and the connection loop.
///
/// Holds no reference back to the connection, so the loop's routing table
/// never keeps its own command queue alive.
pub(crate) struct ChannelInner {
    kind: ChannelKind,
    room_id: String,
    topic: String,
    status: Mutex<ChannelStatus>,
    state_tx: watch::Sender<JoinState>,
    observers: Mutex<Vec<ObserverEntry>>,
    next_observer: AtomicU64,
    events: EventBus,
}

impl ChannelInner {
    fn new(kind: ChannelKind, room_id: &str, topic: String, events: EventBus) -> Self {
        let (state_tx, _) = watch::channel(JoinState::Idle);
        Self {
            kind,
            room_id: room_id.to_string(),
            topic,
            status: Mutex::new(ChannelStatus {
                state: JoinState::Idle,
                join_ref: None,
                ever_joined: false,
                last_error: None,
            }),
            state_tx,
            observers: Mutex::new(Vec::new()),
            next_observer: AtomicU64::new(1),
            events,
        }
    }

    pub(crate) fn topic(&self) -> &str {
        &self.topic
    }

    pub(crate) fn state(&self) -> JoinState {
        lock(&self.status).state
    }

    pub(crate) fn join_ref(&self) -> Option<String> {
        lock(&self.status).join_ref.clone()
    }

    pub(crate) fn join_payload(&self) -> serde_json::Value {
        json!({})
    }

    fn transition(&self, status: &mut ChannelStatus, state: JoinState) {
        if status.state == state {
            return;
        }
        status.state = state;
        self.state_tx.send_replace(state);
        self.events.publish(Event::ChannelStateChanged {
            topic: self.topic.clone(),
            kind: self.kind,
            room_id: self.room_id.clone(),
            state,
        });
    }

    /// Move to `Joining` on behalf of a caller. Returns whether a join
    /// command should be sent.
    fn request_join(&self) -> bool {
        let mut status = lock(&self.status);
        match status.state {
            JoinState::Joining | JoinState::Joined => {
                debug!(topic = %self.topic, state = %status.state, "Join already underway");
                false
            }
            JoinState::Left => {
                warn!(topic = %self.topic, "Channel was left and cannot be joined again");
                false
            }
            JoinState::Idle | JoinState::Errored => {
                status.last_error = None;
                self.transition(&mut status, JoinState::Joining);
                true
            }
        }
    }

    /// A `phx_join` carrying `join_ref` is about to be written.
    /// Returns false if the channel has been left meanwhile.
    pub(crate) fn begin_join(&self, join_ref: &str) -> bool {
        let mut status = lock(&self.status);
        if status.state == JoinState::Left {
            return false;
        }
        status.join_ref = Some(join_ref.to_string());
        status.last_error = None;
        self.transition(&mut status, JoinState::Joining);
        true
    }

    /// Apply an `ok` join reply. Replies for stale join attempts are ignored.
    pub(crate) fn mark_joined(&self, join_ref: &str) -> bool {
        let mut status = lock(&self.status);
        if status.state != JoinState::Joining || status.join_ref.as_deref() != Some(join_ref) {
            return false;
        }
        status.ever_joined = true;
        self.transition(&mut status, JoinState::Joined);
        info!(topic = %self.topic, "Joined channel");
        true
    }

    /// Fail the pending join attempt `join_ref`, if it is still pending.
    /// The `error` payload carries the attempt's `join_ref`, which failures
    /// of the transport lack.
    pub(crate) fn fail_join(&self, join_ref: &str, reason: &str) -> bool {
        {
            let mut status = lock(&self.status);
            if status.state != JoinState::Joining || status.join_ref.as_deref() != Some(join_ref) {
                return false;
            }
            status.last_error = Some(reason.to_string());
            self.transition(&mut status, JoinState::Errored);
        }
        self.dispatch(
            events::ERROR,
            &json!({ "reason": reason, "join_ref": join_ref }),
        );
        true
    }

    /// Move to `Errored` and notify `error` observers. No-op when the
    /// channel is already errored or left.
    pub(crate) fn fail(&self, reason: &str) -> bool {
        {
            let mut status = lock(&self.status);
            if matches!(status.state, JoinState::Errored | JoinState::Left) {
                return false;
            }
            status.last_error = Some(reason.to_string());
            self.transition(&mut status, JoinState::Errored);
        }
        self.dispatch(events::ERROR, &json!({ "reason": reason }));
        true
    }

    /// Final transition. Detaches every observer. Returns false if the
    /// channel was already left.
    pub(crate) fn mark_left(&self) -> bool {
        {
            let mut status = lock(&self.status);
            if status.state == JoinState::Left {
                return false;
            }
            self.transition(&mut status, JoinState::Left);
        }
        lock(&self.observers).clear();
        true
    }

    /// Deliver an inbound application event. Dropped unless joined.
    pub(crate) fn deliver(&self, event: &str, payload: &serde_json::Value) {
        let state = self.state();
        if state != JoinState::Joined {
            debug!(topic = %self.topic, event, state = %state, "Dropping event for channel that is not joined");
            return;
        }
        self.dispatch(event, payload);
    }

    /// Invoke observers for `event` in registration order, outside the lock.
    fn dispatch(&self, event: &str, payload: &serde_json::Value) {
        let handlers: Vec<Observer> = lock(&self.observers)
            .iter()
            .filter(|entry| entry.event == event)
            .map(|entry| Arc::clone(&entry.handler))
            .collect();
        for handler in handlers {
            handler(payload);
        }
    }

    fn add_observer(&self, event: &str, handler: Observer) -> ObserverId {
        let id = ObserverId(self.next_observer.fetch_add(1, Ordering::Relaxed));
        lock(&self.observers).push(ObserverEntry {
            id,
            event: event.to_string(),
            handler,
        });
        id
    }

    fn remove_observer(&self, id: ObserverId) -> bool {
        let mut observers = lock(&self.observers);
        let before = observers.len();
        observers.retain(|entry| entry.id != id);
        observers.len() != before
    }

    /// Fail join attempt `join_ref` if no reply has arrived after `after`.
    pub(crate) fn arm_join_timeout(self: &Arc<Self>, join_ref: String, after: Duration) {
        let channel = Arc::downgrade(self);
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            if let Some(channel) = channel.upgrade() {
                if channel.fail_join(&join_ref, "timeout") {
                    warn!(topic = %channel.topic, "Channel join timed out");
                }
            }
        });
    }
}

// ---------------------------------------------------------------------------
// Channel
// ---------------------------------------------------------------------------

/// Handle to one topic subscription. Clones share the same instance.
#[derive(Clone)]
pub struct Channel {
    inner: Arc<ChannelInner>,
    connection: Connection,
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("topic", &self.inner.topic)
            .field("state", &self.state())
            .finish()
    }
}

impl Channel {
    pub(crate) fn new(connection: &Connection, kind: ChannelKind, room_id: &str) -> Self {
        let topic = connection.config().topics.topic(kind, room_id);
        Self {
            inner: Arc::new(ChannelInner::new(
                kind,
                room_id,
                topic,
                connection.events().clone(),
            )),
            connection: connection.clone(),
        }
    }

    /// Kind that opened the channel. Kinds sharing its topic use it too.
    pub fn kind(&self) -> ChannelKind {
        self.inner.kind
    }

    pub fn room_id(&self) -> &str {
        &self.inner.room_id
    }

    pub fn topic(&self) -> &str {
        &self.inner.topic
    }

    pub fn state(&self) -> JoinState {
        self.inner.state()
    }

    /// Whether any join attempt on this instance has ever succeeded.
    pub fn has_joined(&self) -> bool {
        lock(&self.inner.status).ever_joined
    }

    pub fn last_error(&self) -> Option<String> {
        lock(&self.inner.status).last_error.clone()
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn ptr_eq(&self, other: &Channel) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Register an observer for `event`. Observers run in registration order.
    pub fn on<F>(&self, event: &str, handler: F) -> ObserverId
    where
        F: Fn(&serde_json::Value) + Send + Sync + 'static,
    {
        self.inner.add_observer(event, Arc::new(handler))
    }

    pub fn on_observer(&self, event: &str, handler: Observer) -> ObserverId {
        self.inner.add_observer(event, handler)
    }

    pub fn off(&self, id: ObserverId) -> bool {
        self.inner.remove_observer(id)
    }

    /// Request a join. Completion (or failure) is reported asynchronously
    /// through state changes and `error` observers, never as a return value.
    pub fn join(&self) {
        if !self.inner.request_join() {
            return;
        }
        debug!(topic = %self.inner.topic, "Requesting channel join");
        if !self
            .connection
            .send(SocketCommand::Join(Arc::clone(&self.inner)))
        {
            self.inner.fail("connection closed");
        }
    }

    /// Wait for the current join attempt to settle.
    pub async fn joined(&self) -> Result<(), RealtimeError> {
        let mut rx = self.inner.state_tx.subscribe();
        let state = *rx
            .wait_for(|s| matches!(s, JoinState::Joined | JoinState::Errored | JoinState::Left))
            .await
            .map_err(|_| RealtimeError::ConnectionClosed)?;
        match state {
            JoinState::Joined => Ok(()),
            JoinState::Left => Err(RealtimeError::Join {
                topic: self.inner.topic.clone(),
                reason: "channel left".into(),
            }),
            _ => Err(RealtimeError::Join {
                topic: self.inner.topic.clone(),
                reason: self
                    .last_error()
                    .unwrap_or_else(|| "unknown error".into()),
            }),
        }
    }

    /// Send an application event. Only goes out while joined; otherwise the
    /// push is dropped and counted as skipped.
    pub fn push(&self, event: &str, payload: serde_json::Value) -> PushStatus {
        let stats = self.connection.stats();
        let (state, join_ref) = {
            let status = lock(&self.inner.status);
            (status.state, status.join_ref.clone())
        };
        if state != JoinState::Joined {
            stats.record_skipped();
            debug!(topic = %self.inner.topic, event, state = %state, "Channel not joined; dropping push");
            return PushStatus::Skipped;
        }

        let msg = PhoenixMessage::new(self.inner.topic.clone(), event, payload)
            .with_ref(next_ref())
            .with_join_ref(join_ref);
        if self.connection.send(SocketCommand::Push(msg)) {
            PushStatus::Queued
        } else {
            stats.record_skipped();
            PushStatus::Skipped
        }
    }

    /// Leave the topic. Idempotent; the instance cannot be rejoined.
    pub fn leave(&self) {
        if !self.inner.mark_left() {
            return;
        }
        info!(topic = %self.inner.topic, "Leaving channel");
        self.connection
            .send(SocketCommand::Leave(Arc::clone(&self.inner)));
    }
}
