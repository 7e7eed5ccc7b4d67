//! At most one live channel per topic, and one holder per kind.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, Mutex};

use rogs_common::RealtimeError;
use tracing::{debug, error, info};

use super::handle::Channel;
use super::lease::ChannelLease;
use super::types::{ChannelKind, JoinState};
use crate::connection::Connection;
use crate::protocol::events;
use crate::sync::lock;

pub(crate) struct Entry {
    pub(crate) channel: Channel,
    /// Kinds currently held by a component through a [`ChannelLease`].
    pub(crate) holders: Vec<ChannelKind>,
    /// Kinds that have asked for this channel; their baseline loggers are
    /// installed.
    kinds: Vec<ChannelKind>,
}

pub(crate) type EntryMap = Mutex<HashMap<String, Entry>>;
type Entries = Arc<EntryMap>;

/// Hands out shared channel instances so that repeated requests for the same
/// topic never open a second subscription.
///
/// Kinds whose topics coincide (chat and typing, with the default prefixes)
/// get the same instance. Components take a lease on a kind through the
/// session; channels obtained with [`get_or_create`](Self::get_or_create)
/// are unowned and live until [`release`](Self::release)d.
#[derive(Default)]
pub struct ChannelRegistry {
    entries: Entries,
}

struct Resolved {
    channel: Channel,
    created: bool,
    new_kind: bool,
    stale: Option<Channel>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Existing channel for the topic of `(kind, room_id)`, or a new one that
    /// has been given the baseline observers and asked to join.
    ///
    /// An errored channel is returned as is and asked to join again. A
    /// channel that was left, or that belongs to a connection other than
    /// `connection`, is replaced.
    pub fn get_or_create(
        &self,
        connection: &Connection,
        kind: ChannelKind,
        room_id: &str,
    ) -> Channel {
        let unclaimed = |_: &mut Vec<ChannelKind>| Ok::<_, Infallible>(());
        let resolved = match self.resolve(connection, kind, room_id, unclaimed) {
            Ok(resolved) => resolved,
            Err(never) => match never {},
        };
        self.finish(resolved, kind, Channel::clone)
    }

    /// Take `kind` of the room's channel for one component. `setup` runs
    /// before any join is sent, so observers it registers through the lease
    /// see every event of the join.
    ///
    /// Fails with [`RealtimeError::ChannelInUse`] while another lease on the
    /// same kind and room is held.
    pub(crate) fn lease<F>(
        &self,
        connection: &Connection,
        kind: ChannelKind,
        room_id: &str,
        setup: F,
    ) -> Result<ChannelLease, RealtimeError>
    where
        F: FnOnce(&ChannelLease),
    {
        let resolved = self.resolve(connection, kind, room_id, |holders| {
            if holders.contains(&kind) {
                debug!(kind = %kind, room_id, "Channel kind already held");
                return Err(RealtimeError::ChannelInUse {
                    kind: kind.to_string(),
                    room_id: room_id.to_string(),
                });
            }
            holders.push(kind);
            Ok(())
        })?;
        let entries = Arc::downgrade(&self.entries);
        Ok(self.finish(resolved, kind, |channel| {
            let lease = ChannelLease::new(channel.clone(), kind, entries);
            setup(&lease);
            lease
        }))
    }

    /// Find or create the entry for the topic, applying `claim` to its
    /// holders under the lock.
    fn resolve<E>(
        &self,
        connection: &Connection,
        kind: ChannelKind,
        room_id: &str,
        claim: impl FnOnce(&mut Vec<ChannelKind>) -> Result<(), E>,
    ) -> Result<Resolved, E> {
        let topic = connection.config().topics.topic(kind, room_id);
        let mut entries = lock(&self.entries);
        if let Some(entry) = entries.get_mut(&topic) {
            if entry.channel.connection().ptr_eq(connection)
                && entry.channel.state() != JoinState::Left
            {
                claim(&mut entry.holders)?;
                let new_kind = !entry.kinds.contains(&kind);
                if new_kind {
                    entry.kinds.push(kind);
                }
                return Ok(Resolved {
                    channel: entry.channel.clone(),
                    created: false,
                    new_kind,
                    stale: None,
                });
            }
        }

        let mut holders = Vec::new();
        claim(&mut holders)?;
        let stale = entries.remove(&topic).map(|entry| entry.channel);
        let channel = Channel::new(connection, kind, room_id);
        entries.insert(
            topic,
            Entry {
                channel: channel.clone(),
                holders,
                kinds: vec![kind],
            },
        );
        Ok(Resolved {
            channel,
            created: true,
            new_kind: true,
            stale,
        })
    }

    /// Install loggers, run `setup`, then join if needed.
    fn finish<R>(
        &self,
        resolved: Resolved,
        kind: ChannelKind,
        setup: impl FnOnce(&Channel) -> R,
    ) -> R {
        let Resolved {
            channel,
            created,
            new_kind,
            stale,
        } = resolved;

        if let Some(stale) = stale {
            debug!(topic = %stale.topic(), "Replacing stale channel");
            stale.leave();
        }

        if created {
            install_error_logger(&channel);
        }
        if new_kind {
            install_event_loggers(&channel, kind);
        }
        let output = setup(&channel);

        if created {
            info!(topic = %channel.topic(), kind = %kind, "Created channel");
            channel.join();
        } else if channel.state() == JoinState::Errored {
            info!(topic = %channel.topic(), "Retrying join for errored channel");
            channel.join();
        }
        output
    }

    /// The channel serving `kind` for `room_id`, if one has been requested.
    pub fn get(&self, kind: ChannelKind, room_id: &str) -> Option<Channel> {
        lock(&self.entries)
            .values()
            .find(|entry| serves(entry, kind, room_id))
            .map(|entry| entry.channel.clone())
    }

    /// Drop `kind`'s hold on the room's channel, leaving and forgetting the
    /// channel once no other kind holds it. No-op if there is none.
    pub fn release(&self, kind: ChannelKind, room_id: &str) {
        let left = {
            let mut entries = lock(&self.entries);
            let topic = entries
                .iter()
                .find(|(_, entry)| serves(entry, kind, room_id))
                .map(|(topic, _)| topic.clone());
            match topic {
                Some(topic) => {
                    let still_held = entries.get_mut(&topic).is_some_and(|entry| {
                        entry.holders.retain(|held| *held != kind);
                        !entry.holders.is_empty()
                    });
                    if still_held {
                        debug!(topic = %topic, kind = %kind, "Channel still held by another kind");
                        None
                    } else {
                        entries.remove(&topic).map(|entry| entry.channel)
                    }
                }
                None => {
                    debug!(kind = %kind, room_id, "No channel to release");
                    None
                }
            }
        };
        if let Some(channel) = left {
            channel.leave();
        }
    }

    /// Leave and forget every channel.
    pub fn release_all(&self) {
        let drained: Vec<Channel> = lock(&self.entries)
            .drain()
            .map(|(_, entry)| entry.channel)
            .collect();
        for channel in drained {
            channel.leave();
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.entries).is_empty()
    }
}

fn serves(entry: &Entry, kind: ChannelKind, room_id: &str) -> bool {
    entry.channel.room_id() == room_id && entry.kinds.contains(&kind)
}

fn install_error_logger(channel: &Channel) {
    let topic = channel.topic().to_string();
    channel.on(events::ERROR, move |payload| {
        let reason = payload
            .get("reason")
            .and_then(|r| r.as_str())
            .unwrap_or("unknown error");
        error!(topic = %topic, reason, "Channel error");
    });
}

/// Debug logger for each inbound event of `kind`.
fn install_event_loggers(channel: &Channel, kind: ChannelKind) {
    for &event in kind.inbound_events() {
        let topic = channel.topic().to_string();
        channel.on(event, move |payload| {
            debug!(topic = %topic, event, payload = %payload, "Channel event");
        });
    }
}
