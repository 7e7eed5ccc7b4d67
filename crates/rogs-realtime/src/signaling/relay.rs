use std::sync::{Arc, Mutex, Weak};

use rogs_common::RealtimeError;
use tracing::{debug, info, warn};

use super::hooks::{SignalHooks, SignalKind};
use super::types::CallControls;
use crate::channel::{Channel, ChannelKind, ChannelLease, ChannelRegistry, PushStatus};
use crate::connection::{Connection, ConnectionStats};
use crate::events::{Event, EventBus};
use crate::protocol::{events, PeerAction, PeerReadyPayload};
use crate::sync::lock;

#[derive(Default)]
struct Slot {
    lease: Option<ChannelLease>,
    /// The join was refused before the lease could be stored.
    refused: bool,
}

/// Signaling for one room.
///
/// If the join is rejected or times out before ever succeeding, the channel
/// reference is dropped: later call intents are skipped and inbound
/// signaling stops reaching this instance's handlers. Transport loss, or any
/// failure after a successful join, keeps the reference so the channel
/// rejoins on reconnect.
pub struct SignalingChannel {
    room_id: String,
    slot: Arc<Mutex<Slot>>,
    controls: Mutex<CallControls>,
    stats: Arc<ConnectionStats>,
    events: EventBus,
}

impl SignalingChannel {
    pub(crate) fn join(
        registry: &ChannelRegistry,
        connection: &Connection,
        room_id: &str,
        hooks: SignalHooks,
    ) -> Result<Self, RealtimeError> {
        let slot = Arc::new(Mutex::new(Slot::default()));
        let weak_slot = Arc::downgrade(&slot);

        let lease = registry.lease(connection, ChannelKind::Signal, room_id, |lease| {
            for kind in SignalKind::ALL {
                match hooks.handler(kind) {
                    Some(handler) => {
                        lease.on_observer(kind.event_name(), Arc::clone(handler));
                    }
                    None => {
                        let room_id = room_id.to_string();
                        lease.on(kind.event_name(), move |_| {
                            debug!(room_id = %room_id, event = kind.event_name(), "No handler for signaling event; dropped");
                        });
                    }
                }
            }
            lease.on(events::ERROR, move |payload| {
                release_on_join_refusal(&weak_slot, payload);
            });
        })?;

        let refused = {
            let mut guard = lock(&slot);
            if guard.refused {
                Some(lease)
            } else {
                guard.lease = Some(lease);
                None
            }
        };
        if let Some(lease) = refused {
            warn!(topic = %lease.channel().topic(), "Signaling channel failed to join; call intents will be dropped");
            lease.release();
        }

        Ok(Self {
            room_id: room_id.to_string(),
            slot,
            controls: Mutex::new(CallControls::default()),
            stats: connection.stats_handle(),
            events: connection.events().clone(),
        })
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    /// The underlying channel, unless it was dropped after a failed join
    /// or destroyed.
    pub fn channel(&self) -> Option<Channel> {
        lock(&self.slot)
            .lease
            .as_ref()
            .map(|lease| lease.channel().clone())
    }

    pub fn is_established(&self) -> bool {
        lock(&self.slot).lease.is_some()
    }

    pub fn controls(&self) -> CallControls {
        *lock(&self.controls)
    }

    /// Announce that this client is ready to start a call.
    pub fn start_call(&self) -> PushStatus {
        self.send_intent(PeerAction::Start)
    }

    /// Announce that this client is leaving the call.
    pub fn stop_call(&self) -> PushStatus {
        self.send_intent(PeerAction::Stop)
    }

    /// Flip the local microphone flag. Nothing is sent.
    pub fn toggle_mic(&self) -> bool {
        self.update(|c| c.mic_enabled = !c.mic_enabled).mic_enabled
    }

    /// Flip the local speaker flag. Nothing is sent.
    pub fn toggle_speakers(&self) -> bool {
        self.update(|c| c.speakers_enabled = !c.speakers_enabled)
            .speakers_enabled
    }

    /// Leave the channel. Idempotent.
    pub fn destroy(&self) {
        let lease = lock(&self.slot).lease.take();
        if let Some(lease) = lease {
            info!(topic = %lease.channel().topic(), "Leaving signaling channel");
            lease.release();
        }
    }

    fn send_intent(&self, action: PeerAction) -> PushStatus {
        let status = {
            let slot = lock(&self.slot);
            match slot.lease.as_ref() {
                Some(lease) => {
                    match serde_json::to_value(PeerReadyPayload::now(&self.room_id, action)) {
                        Ok(payload) => lease.channel().push(events::PEER_READY, payload),
                        Err(e) => {
                            self.stats.record_skipped();
                            warn!(error = %e, "Failed to encode peer-ready payload");
                            PushStatus::Skipped
                        }
                    }
                }
                None => {
                    self.stats.record_skipped();
                    debug!(room_id = %self.room_id, action = %action, "No signaling channel; dropping call intent");
                    PushStatus::Skipped
                }
            }
        };

        if status == PushStatus::Queued {
            self.update(|c| c.call_active = action == PeerAction::Start);
        }
        status
    }

    fn update(&self, apply: impl FnOnce(&mut CallControls)) -> CallControls {
        let controls = {
            let mut controls = lock(&self.controls);
            apply(&mut controls);
            *controls
        };
        debug!(room_id = %self.room_id, ?controls, "Call controls changed");
        self.events.publish(Event::CallStateChanged {
            room_id: self.room_id.clone(),
            controls,
        });
        controls
    }
}

impl Drop for SignalingChannel {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// Drop the lease after a rejected or timed-out join on a channel that has
/// never joined. Only join failures carry a `join_ref`.
fn release_on_join_refusal(slot: &Weak<Mutex<Slot>>, payload: &serde_json::Value) {
    if payload.get("join_ref").is_none() {
        return;
    }
    let Some(slot) = slot.upgrade() else {
        return;
    };
    let lease = {
        let mut slot = lock(&slot);
        match slot.lease.as_ref() {
            Some(lease) if !lease.channel().has_joined() => slot.lease.take(),
            Some(_) => None,
            None => {
                slot.refused = true;
                None
            }
        }
    };
    if let Some(lease) = lease {
        let reason = payload
            .get("reason")
            .and_then(|r| r.as_str())
            .unwrap_or("unknown error");
        warn!(topic = %lease.channel().topic(), reason, "Signaling channel failed to join; call intents will be dropped");
        lease.release();
    }
}
