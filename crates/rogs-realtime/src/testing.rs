//! Helpers shared by the in-crate tests.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::connection::{ConnectionState, MemoryConnector, MemoryPeer, RealtimeConfig};
use crate::protocol::{phx, PhoenixMessage};
use crate::session::RealtimeSession;

pub(crate) fn session_with(config: RealtimeConfig) -> (RealtimeSession, Arc<MemoryConnector>) {
    let connector = Arc::new(MemoryConnector::new());
    let session = RealtimeSession::with_connector(config, connector.clone());
    (session, connector)
}

/// Session connected to a fresh in-memory peer.
pub(crate) async fn connected() -> (RealtimeSession, Arc<MemoryConnector>, MemoryPeer) {
    let (session, connector) = session_with(RealtimeConfig::default());
    let peer = connector.add_peer();
    let connection = session.connect("test-token");
    connection
        .wait_for_state(ConnectionState::Connected)
        .await
        .unwrap();
    (session, connector, peer)
}

/// Next frame, which must be a join for `topic`.
pub(crate) async fn expect_join(peer: &mut MemoryPeer, topic: &str) -> PhoenixMessage {
    let join = peer.next_frame().await.expect("join frame");
    assert_eq!(join.event, phx::JOIN);
    assert_eq!(join.topic, topic);
    assert!(join.msg_ref.is_some());
    assert_eq!(join.join_ref, join.msg_ref);
    join
}

/// Read and acknowledge a join for `topic`.
pub(crate) async fn accept_join(peer: &mut MemoryPeer, topic: &str) -> PhoenixMessage {
    let join = expect_join(peer, topic).await;
    peer.reply_ok(&join);
    join
}

/// Collects payloads passed to an observer.
#[derive(Clone, Default)]
pub(crate) struct Recorder {
    seen: Arc<Mutex<Vec<serde_json::Value>>>,
}

impl Recorder {
    pub(crate) fn handler(&self) -> impl Fn(&serde_json::Value) + Send + Sync + 'static {
        let seen = Arc::clone(&self.seen);
        move |payload: &serde_json::Value| seen.lock().unwrap().push(payload.clone())
    }

    pub(crate) fn values(&self) -> Vec<serde_json::Value> {
        self.seen.lock().unwrap().clone()
    }

    pub(crate) fn len(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

/// Observer that signals each invocation on a channel, for awaiting
/// delivery of a marker event.
pub(crate) fn notifier() -> (
    impl Fn(&serde_json::Value) + Send + Sync + 'static,
    mpsc::UnboundedReceiver<serde_json::Value>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        move |payload: &serde_json::Value| {
            let _ = tx.send(payload.clone());
        },
        rx,
    )
}
