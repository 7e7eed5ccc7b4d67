use std::sync::Arc;

use crate::channel::Observer;
use crate::protocol::events;

pub type SignalHandler = Observer;

/// Inbound signaling events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    Offer,
    Answer,
    IceCandidate,
}

impl SignalKind {
    pub const ALL: [SignalKind; 3] = [SignalKind::Offer, SignalKind::Answer, SignalKind::IceCandidate];

    pub fn event_name(self) -> &'static str {
        match self {
            SignalKind::Offer => events::OFFER,
            SignalKind::Answer => events::ANSWER,
            SignalKind::IceCandidate => events::ICE_CANDIDATE,
        }
    }
}

/// Handlers for signaling events. Any may be absent; events without a
/// handler are dropped.
#[derive(Clone, Default)]
pub struct SignalHooks {
    pub offer: Option<SignalHandler>,
    pub answer: Option<SignalHandler>,
    pub ice_candidate: Option<SignalHandler>,
}

impl SignalHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_offer<F>(mut self, handler: F) -> Self
    where
        F: Fn(&serde_json::Value) + Send + Sync + 'static,
    {
        self.offer = Some(Arc::new(handler));
        self
    }

    pub fn on_answer<F>(mut self, handler: F) -> Self
    where
        F: Fn(&serde_json::Value) + Send + Sync + 'static,
    {
        self.answer = Some(Arc::new(handler));
        self
    }

    pub fn on_ice_candidate<F>(mut self, handler: F) -> Self
    where
        F: Fn(&serde_json::Value) + Send + Sync + 'static,
    {
        self.ice_candidate = Some(Arc::new(handler));
        self
    }

    pub fn handler(&self, kind: SignalKind) -> Option<&SignalHandler> {
        match kind {
            SignalKind::Offer => self.offer.as_ref(),
            SignalKind::Answer => self.answer.as_ref(),
            SignalKind::IceCandidate => self.ice_candidate.as_ref(),
        }
    }
}

impl std::fmt::Debug for SignalHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalHooks")
            .field("offer", &self.offer.is_some())
            .field("answer", &self.answer.is_some())
            .field("ice_candidate", &self.ice_candidate.is_some())
            .finish()
    }
}
