//! One component's hold on a registry channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use tracing::debug;

use super::handle::Channel;
use super::registry::EntryMap;
use super::types::{ChannelKind, Observer, ObserverId};
use crate::sync::lock;

/// Exclusive hold on one kind of a room's channel.
///
/// Observers registered through the lease are detached when it is released,
/// and the channel is left once no other kind holds it. Released on drop.
pub(crate) struct ChannelLease {
    channel: Channel,
    kind: ChannelKind,
    entries: Weak<EntryMap>,
    observers: Mutex<Vec<ObserverId>>,
    released: AtomicBool,
}

impl ChannelLease {
    pub(crate) fn new(channel: Channel, kind: ChannelKind, entries: Weak<EntryMap>) -> Self {
        Self {
            channel,
            kind,
            entries,
            observers: Mutex::new(Vec::new()),
            released: AtomicBool::new(false),
        }
    }

    pub(crate) fn channel(&self) -> &Channel {
        &self.channel
    }

    pub(crate) fn on<F>(&self, event: &str, handler: F) -> ObserverId
    where
        F: Fn(&serde_json::Value) + Send + Sync + 'static,
    {
        self.on_observer(event, Arc::new(handler))
    }

    pub(crate) fn on_observer(&self, event: &str, handler: Observer) -> ObserverId {
        let id = self.channel.on_observer(event, handler);
        lock(&self.observers).push(id);
        id
    }

    /// Give the kind back. Idempotent.
    pub(crate) fn release(&self) {
        if self.released.swap(true, Ordering::AcqRel) {
            return;
        }
        let observers = std::mem::take(&mut *lock(&self.observers));
        for id in observers {
            self.channel.off(id);
        }
        if self.release_hold() {
            self.channel.leave();
        } else {
            debug!(topic = %self.channel.topic(), kind = %self.kind, "Released channel kind; channel stays");
        }
    }

    /// Remove this kind from the registry entry. Returns whether the channel
    /// is now unheld and should be left.
    fn release_hold(&self) -> bool {
        let Some(entries) = self.entries.upgrade() else {
            return true;
        };
        let mut entries = lock(&entries);
        let topic = self.channel.topic();
        let Some(entry) = entries.get_mut(topic) else {
            return false;
        };
        // Replaced or already released through the registry.
        if !entry.channel.ptr_eq(&self.channel) {
            return false;
        }
        entry.holders.retain(|held| *held != self.kind);
        if entry.holders.is_empty() {
            entries.remove(topic);
            true
        } else {
            false
        }
    }
}

impl Drop for ChannelLease {
    fn drop(&mut self) {
        self.release();
    }
}
