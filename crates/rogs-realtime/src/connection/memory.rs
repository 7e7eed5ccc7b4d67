//! Scripted in-memory transports standing in for the server in tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use futures_util::stream;
use rogs_common::RealtimeError;
use serde_json::json;
use tokio::sync::mpsc;

use super::transport::{Connector, Transport};
use crate::protocol::{phx, PhoenixMessage};
use crate::sync::lock;

/// Connector that hands out scripted in-memory transports, one per attempt.
///
/// Each queued peer serves one connect call; a queued failure (or an empty
/// queue) fails the attempt.
#[derive(Default)]
pub(crate) struct MemoryConnector {
    queue: Mutex<VecDeque<Result<Transport, RealtimeError>>>,
    attempts: AtomicUsize,
    last_url: Mutex<Option<String>>,
}

impl MemoryConnector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queue a transport and return the server side of it.
    pub(crate) fn add_peer(&self) -> MemoryPeer {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel::<String>();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel::<String>();

        let sink = futures_util::sink::unfold(
            outbound_tx,
            |tx: mpsc::UnboundedSender<String>, frame: String| async move {
                tx.send(frame).map_err(|_| RealtimeError::ConnectionClosed)?;
                Ok::<_, RealtimeError>(tx)
            },
        );
        let stream = stream::unfold(inbound_rx, |mut rx| async move {
            rx.recv().await.map(|frame| (Ok(frame), rx))
        });

        lock(&self.queue).push_back(Ok(Transport {
            sink: Box::pin(sink),
            stream: Box::pin(stream),
        }));

        MemoryPeer {
            outbound: outbound_rx,
            inbound: Some(inbound_tx),
        }
    }

    /// Queue a failed connect attempt.
    pub(crate) fn add_failure(&self, reason: &str) {
        lock(&self.queue).push_back(Err(RealtimeError::Transport(reason.to_string())));
    }

    /// Number of connect calls made so far.
    pub(crate) fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub(crate) fn last_url(&self) -> Option<String> {
        lock(&self.last_url).clone()
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, url: &str) -> Result<Transport, RealtimeError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        *lock(&self.last_url) = Some(url.to_string());
        lock(&self.queue)
            .pop_front()
            .unwrap_or_else(|| Err(RealtimeError::Transport("connection refused".into())))
    }
}

/// Server side of an in-memory transport.
///
/// Heartbeats written by the client are answered automatically whenever
/// frames are read through [`next_frame`](Self::next_frame) or
/// [`try_next_frame`](Self::try_next_frame).
pub(crate) struct MemoryPeer {
    outbound: mpsc::UnboundedReceiver<String>,
    inbound: Option<mpsc::UnboundedSender<String>>,
}

impl MemoryPeer {
    /// Next frame written by the client, heartbeats excepted.
    /// `None` once the client side is gone.
    pub(crate) async fn next_frame(&mut self) -> Option<PhoenixMessage> {
        loop {
            let text = self.outbound.recv().await?;
            if let Some(msg) = self.filter(&text) {
                return Some(msg);
            }
        }
    }

    /// Like [`next_frame`](Self::next_frame) but only looks at frames already written.
    pub(crate) fn try_next_frame(&mut self) -> Option<PhoenixMessage> {
        while let Ok(text) = self.outbound.try_recv() {
            if let Some(msg) = self.filter(&text) {
                return Some(msg);
            }
        }
        None
    }

    fn filter(&self, text: &str) -> Option<PhoenixMessage> {
        let msg = PhoenixMessage::decode(text).ok()?;
        if msg.topic == phx::SOCKET_TOPIC && msg.event == phx::HEARTBEAT {
            self.reply_ok(&msg);
            return None;
        }
        Some(msg)
    }

    /// Write a frame to the client.
    pub(crate) fn send(&self, msg: &PhoenixMessage) -> bool {
        let (Some(tx), Ok(text)) = (&self.inbound, msg.encode()) else {
            return false;
        };
        tx.send(text).is_ok()
    }

    /// Broadcast an application event on `topic`.
    pub(crate) fn push_event(&self, topic: &str, event: &str, payload: serde_json::Value) -> bool {
        self.send(&PhoenixMessage::new(topic, event, payload))
    }

    /// Acknowledge a join (or any push) with `status: ok`.
    pub(crate) fn reply_ok(&self, request: &PhoenixMessage) -> bool {
        self.reply(request, json!({"status": "ok", "response": {}}))
    }

    /// Reject a join (or any push) with the given reason.
    pub(crate) fn reply_error(&self, request: &PhoenixMessage, reason: &str) -> bool {
        self.reply(
            request,
            json!({"status": "error", "response": {"reason": reason}}),
        )
    }

    fn reply(&self, request: &PhoenixMessage, payload: serde_json::Value) -> bool {
        let mut reply = PhoenixMessage::new(request.topic.clone(), phx::REPLY, payload)
            .with_join_ref(request.join_ref.clone());
        reply.msg_ref = request.msg_ref.clone();
        self.send(&reply)
    }

    /// Close the server side. The client observes the stream ending.
    pub(crate) fn close(&mut self) {
        self.inbound = None;
    }
}
