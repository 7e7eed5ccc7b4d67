use std::sync::Arc;

use rogs_common::{RealtimeError, SessionId};
use tokio::sync::{mpsc, watch};
use tracing::info;

use super::socket::{connection_loop, SocketContext};
use super::transport::Connector;
use super::types::{ConnectionState, ConnectionStats, RealtimeConfig};
use crate::channel::ChannelInner;
use crate::events::EventBus;
use crate::protocol::PhoenixMessage;

/// Work for the connection loop. Processed strictly in send order.
pub(crate) enum SocketCommand {
    Join(Arc<ChannelInner>),
    Leave(Arc<ChannelInner>),
    Push(PhoenixMessage),
    Disconnect,
}

struct ConnectionInner {
    session_id: SessionId,
    auth_token: String,
    config: RealtimeConfig,
    commands: mpsc::UnboundedSender<SocketCommand>,
    state: watch::Receiver<ConnectionState>,
    stats: Arc<ConnectionStats>,
    events: EventBus,
}

/// Handle to one client connection. Clones refer to the same connection.
#[derive(Clone)]
pub struct Connection {
    inner: Arc<ConnectionInner>,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("session_id", &self.inner.session_id)
            .field("auth_token", &"[REDACTED]")
            .field("endpoint", &self.inner.config.endpoint)
            .field("state", &self.state())
            .finish()
    }
}

impl Connection {
    /// Spawn the connection loop and return its handle. Must be called
    /// within a Tokio runtime.
    pub(crate) fn open(
        config: RealtimeConfig,
        auth_token: &str,
        connector: Arc<dyn Connector>,
        events: EventBus,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
        let stats = Arc::new(ConnectionStats::default());
        let session_id = SessionId::new();

        info!(session = %session_id, endpoint = %config.endpoint, "Opening realtime connection");

        let ctx = SocketContext {
            session_id,
            url: config.ws_url(auth_token),
            config: config.clone(),
            connector,
            state: state_tx,
            stats: Arc::clone(&stats),
            events: events.clone(),
        };
        tokio::spawn(connection_loop(ctx, command_rx));

        Self {
            inner: Arc::new(ConnectionInner {
                session_id,
                auth_token: auth_token.to_string(),
                config,
                commands: command_tx,
                state: state_rx,
                stats,
                events,
            }),
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.inner.session_id
    }

    /// Token this connection was opened with.
    pub fn auth_token(&self) -> &str {
        &self.inner.auth_token
    }

    pub fn state(&self) -> ConnectionState {
        *self.inner.state.borrow()
    }

    /// False once the loop has stopped or given up reconnecting.
    pub fn is_live(&self) -> bool {
        !self.inner.commands.is_closed() && !self.state().is_terminal()
    }

    pub fn stats(&self) -> &ConnectionStats {
        &self.inner.stats
    }

    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    pub fn config(&self) -> &RealtimeConfig {
        &self.inner.config
    }

    pub fn ptr_eq(&self, other: &Connection) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Wait until the connection reaches `target`. Fails if the connection
    /// stops or gives up first.
    pub async fn wait_for_state(&self, target: ConnectionState) -> Result<(), RealtimeError> {
        let mut rx = self.inner.state.clone();
        let reached = *rx
            .wait_for(|s| *s == target || s.is_terminal())
            .await
            .map_err(|_| RealtimeError::ConnectionClosed)?;
        if reached == target {
            Ok(())
        } else {
            Err(RealtimeError::ConnectionClosed)
        }
    }

    /// Wait for the connection loop to exit.
    pub async fn closed(&self) {
        let mut rx = self.inner.state.clone();
        while rx.changed().await.is_ok() {}
    }

    pub(crate) fn stats_handle(&self) -> Arc<ConnectionStats> {
        Arc::clone(&self.inner.stats)
    }

    pub(crate) fn send(&self, command: SocketCommand) -> bool {
        self.inner.commands.send(command).is_ok()
    }

    /// Ask the loop to leave every channel and close.
    pub(crate) fn shutdown(&self) {
        self.send(SocketCommand::Disconnect);
    }
}
