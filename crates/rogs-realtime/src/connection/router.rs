use std::collections::HashMap;
use std::sync::Arc;

use crate::channel::{ChannelInner, JoinState};

/// Channels known to the connection loop, by topic.
///
/// A registry keeps one channel per topic, but a left channel and its
/// replacement, or channels from separate registries, can briefly share one,
/// so each topic maps to a list.
#[derive(Default)]
pub(crate) struct Router {
    topics: HashMap<String, Vec<Arc<ChannelInner>>>,
}

impl Router {
    pub(crate) fn insert(&mut self, channel: &Arc<ChannelInner>) {
        let members = self.topics.entry(channel.topic().to_string()).or_default();
        if !members.iter().any(|c| Arc::ptr_eq(c, channel)) {
            members.push(Arc::clone(channel));
        }
    }

    pub(crate) fn remove(&mut self, channel: &Arc<ChannelInner>) {
        if let Some(members) = self.topics.get_mut(channel.topic()) {
            members.retain(|c| !Arc::ptr_eq(c, channel));
            if members.is_empty() {
                self.topics.remove(channel.topic());
            }
        }
    }

    pub(crate) fn members(&self, topic: &str) -> Vec<Arc<ChannelInner>> {
        self.topics.get(topic).cloned().unwrap_or_default()
    }

    /// Every routed channel that has not been left.
    pub(crate) fn channels(&self) -> Vec<Arc<ChannelInner>> {
        self.topics
            .values()
            .flatten()
            .filter(|c| c.state() != JoinState::Left)
            .cloned()
            .collect()
    }

    pub(crate) fn fail_all(&self, reason: &str) {
        for channel in self.channels() {
            channel.fail(reason);
        }
    }

    /// Drain every channel, returning them for a final leave.
    pub(crate) fn drain(&mut self) -> Vec<Arc<ChannelInner>> {
        self.topics.drain().flat_map(|(_, members)| members).collect()
    }
}
