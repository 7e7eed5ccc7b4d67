//! Background connection loop with heartbeat and auto-reconnect.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use rogs_common::{new_correlation_id, RealtimeError, SessionId};
use serde_json::json;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::handle::SocketCommand;
use super::handler::handle_phoenix_message;
use super::router::Router;
use super::transport::{Connector, FrameSink, Transport};
use super::types::{ConnectionState, ConnectionStats, RealtimeConfig};
use crate::channel::ChannelInner;
use crate::events::{Event, EventBus};
use crate::protocol::{next_ref, phx, PhoenixMessage};

/// Everything the loop owns apart from its command queue.
pub(crate) struct SocketContext {
    pub(crate) session_id: SessionId,
    pub(crate) url: Result<String, RealtimeError>,
    pub(crate) config: RealtimeConfig,
    pub(crate) connector: Arc<dyn Connector>,
    pub(crate) state: watch::Sender<ConnectionState>,
    pub(crate) stats: Arc<ConnectionStats>,
    pub(crate) events: EventBus,
}

impl SocketContext {
    fn set_state(&self, state: ConnectionState) {
        let changed = self.state.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
        if changed {
            self.events.publish(Event::ConnectionStateChanged {
                session_id: self.session_id.to_string(),
                state,
            });
        }
    }
}

enum SessionEnd {
    /// Disconnect requested, or every handle dropped.
    Shutdown,
    /// Transport lost; reconnect.
    Lost(String),
}

// ---------------------------------------------------------------------------
// Connection Loop
// ---------------------------------------------------------------------------

pub(crate) async fn connection_loop(
    ctx: SocketContext,
    mut commands: mpsc::UnboundedReceiver<SocketCommand>,
) {
    let url = match &ctx.url {
        Ok(url) => url.clone(),
        Err(e) => {
            error!(session = %ctx.session_id, error = %e, "Cannot open realtime connection");
            ctx.set_state(ConnectionState::Errored);
            return;
        }
    };

    let mut router = Router::default();
    let mut failed_attempts: u32 = 0;
    let mut reconnect_delay = ctx.config.reconnect_delay();

    loop {
        ctx.set_state(ConnectionState::Connecting);
        let attempt = new_correlation_id();
        ctx.stats.record_connect_attempt();
        info!(
            session = %ctx.session_id,
            attempt = %attempt,
            endpoint = %ctx.config.endpoint,
            "Connecting to realtime endpoint"
        );

        let mut session_was_up = false;
        match tokio::time::timeout(ctx.config.connect_timeout(), ctx.connector.connect(&url)).await
        {
            Ok(Ok(transport)) => {
                session_was_up = true;
                failed_attempts = 0;
                reconnect_delay = ctx.config.reconnect_delay();
                ctx.set_state(ConnectionState::Connected);
                info!(session = %ctx.session_id, attempt = %attempt, "Realtime connection established");

                match run_session(&ctx, transport, &mut router, &mut commands).await {
                    SessionEnd::Shutdown => {
                        ctx.set_state(ConnectionState::Disconnected);
                        info!(session = %ctx.session_id, "Realtime connection closed");
                        return;
                    }
                    SessionEnd::Lost(reason) => {
                        warn!(session = %ctx.session_id, reason = %reason, "Realtime connection lost");
                        router.fail_all("connection lost");
                    }
                }
            }
            Ok(Err(e)) => {
                error!(session = %ctx.session_id, attempt = %attempt, error = %e, "Failed to connect to realtime endpoint");
            }
            Err(_elapsed) => {
                error!(
                    session = %ctx.session_id,
                    attempt = %attempt,
                    "Realtime connection timed out after {}s",
                    ctx.config.connect_timeout().as_secs()
                );
            }
        }

        if !session_was_up {
            failed_attempts += 1;
        }
        if failed_attempts >= ctx.config.max_reconnect_attempts {
            error!(
                session = %ctx.session_id,
                attempts = failed_attempts,
                "Giving up on realtime connection"
            );
            ctx.set_state(ConnectionState::Errored);
            router.fail_all("connection failed");
            return;
        }

        ctx.set_state(ConnectionState::Disconnected);
        info!(
            session = %ctx.session_id,
            delay = reconnect_delay.as_secs(),
            "Reconnecting in {} seconds",
            reconnect_delay.as_secs()
        );
        if !wait_offline(&ctx, reconnect_delay, &mut router, &mut commands).await {
            info!(session = %ctx.session_id, "Realtime connection closed while offline");
            return;
        }
        reconnect_delay = (reconnect_delay * 2).min(ctx.config.max_reconnect_delay());
    }
}

/// Serve one open transport until it drops or a shutdown is requested.
async fn run_session(
    ctx: &SocketContext,
    transport: Transport,
    router: &mut Router,
    commands: &mut mpsc::UnboundedReceiver<SocketCommand>,
) -> SessionEnd {
    let Transport {
        mut sink,
        mut stream,
    } = transport;
    let mut pending_heartbeat: Option<String> = None;

    // Rejoin channels carried over from a previous session, or registered
    // while offline.
    for channel in router.channels() {
        if let Err(e) = send_join(ctx, &mut sink, &channel).await {
            return SessionEnd::Lost(e.to_string());
        }
    }

    let period = ctx.config.heartbeat_interval();
    let mut heartbeat = tokio::time::interval_at(Instant::now() + period, period);
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else {
                    close_session(&mut sink, router).await;
                    return SessionEnd::Shutdown;
                };
                match command {
                    SocketCommand::Disconnect => {
                        close_session(&mut sink, router).await;
                        return SessionEnd::Shutdown;
                    }
                    command => {
                        if let Err(e) = handle_command(ctx, command, &mut sink, router).await {
                            return SessionEnd::Lost(e.to_string());
                        }
                    }
                }
            }
            frame = stream.next() => match frame {
                Some(Ok(text)) => match PhoenixMessage::decode(&text) {
                    Ok(msg) => handle_phoenix_message(&msg, router, &mut pending_heartbeat),
                    Err(_) => debug!(text = %text, "Unrecognized frame"),
                },
                Some(Err(RealtimeError::ConnectionClosed)) | None => {
                    info!(session = %ctx.session_id, "Realtime endpoint closed connection");
                    return SessionEnd::Lost("closed by server".into());
                }
                Some(Err(e)) => {
                    warn!(session = %ctx.session_id, error = %e, "WebSocket error");
                    return SessionEnd::Lost(e.to_string());
                }
            },
            _ = heartbeat.tick() => {
                if let Some(heartbeat_ref) = pending_heartbeat.take() {
                    warn!(session = %ctx.session_id, heartbeat_ref = %heartbeat_ref, "Heartbeat timed out");
                    return SessionEnd::Lost("heartbeat timeout".into());
                }
                let msg = PhoenixMessage::new(phx::SOCKET_TOPIC, phx::HEARTBEAT, json!({}))
                    .with_ref(next_ref());
                pending_heartbeat = msg.msg_ref.clone();
                if let Err(e) = write(&mut sink, &msg).await {
                    return SessionEnd::Lost(e.to_string());
                }
            }
        }
    }
}

async fn handle_command(
    ctx: &SocketContext,
    command: SocketCommand,
    sink: &mut FrameSink,
    router: &mut Router,
) -> Result<(), RealtimeError> {
    match command {
        SocketCommand::Join(channel) => {
            router.insert(&channel);
            send_join(ctx, sink, &channel).await
        }
        SocketCommand::Leave(channel) => {
            router.remove(&channel);
            send_leave(sink, &channel).await
        }
        SocketCommand::Push(msg) => {
            write(sink, &msg).await?;
            ctx.stats.record_sent();
            Ok(())
        }
        // Handled by the caller.
        SocketCommand::Disconnect => Ok(()),
    }
}

/// Sleep out the backoff while still accepting commands. Joins are queued
/// for the next session, pushes are dropped. Returns false on shutdown.
async fn wait_offline(
    ctx: &SocketContext,
    delay: Duration,
    router: &mut Router,
    commands: &mut mpsc::UnboundedReceiver<SocketCommand>,
) -> bool {
    let sleep = tokio::time::sleep(delay);
    tokio::pin!(sleep);

    loop {
        tokio::select! {
            _ = &mut sleep => return true,
            command = commands.recv() => match command {
                None | Some(SocketCommand::Disconnect) => {
                    for channel in router.drain() {
                        channel.mark_left();
                    }
                    ctx.set_state(ConnectionState::Disconnected);
                    return false;
                }
                Some(SocketCommand::Join(channel)) => router.insert(&channel),
                Some(SocketCommand::Leave(channel)) => router.remove(&channel),
                Some(SocketCommand::Push(msg)) => {
                    ctx.stats.record_skipped();
                    debug!(topic = %msg.topic, event = %msg.event, "Offline; dropping push");
                }
            }
        }
    }
}

async fn send_join(
    ctx: &SocketContext,
    sink: &mut FrameSink,
    channel: &Arc<ChannelInner>,
) -> Result<(), RealtimeError> {
    let join_ref = next_ref();
    if !channel.begin_join(&join_ref) {
        return Ok(());
    }
    let msg = PhoenixMessage::new(channel.topic(), phx::JOIN, channel.join_payload())
        .with_ref(join_ref.clone())
        .with_join_ref(Some(join_ref.clone()));
    write(sink, &msg).await?;
    debug!(topic = %channel.topic(), join_ref = %join_ref, "Sent channel join");
    channel.arm_join_timeout(join_ref, ctx.config.join_timeout());
    Ok(())
}

async fn send_leave(sink: &mut FrameSink, channel: &ChannelInner) -> Result<(), RealtimeError> {
    let msg = PhoenixMessage::new(channel.topic(), phx::LEAVE, json!({}))
        .with_ref(next_ref())
        .with_join_ref(channel.join_ref());
    write(sink, &msg).await
}

/// Leave every channel, then close the transport. Errors are ignored; the
/// session is ending either way.
async fn close_session(sink: &mut FrameSink, router: &mut Router) {
    for channel in router.drain() {
        channel.mark_left();
        let _ = send_leave(sink, &channel).await;
    }
    let _ = sink.close().await;
}

async fn write(sink: &mut FrameSink, msg: &PhoenixMessage) -> Result<(), RealtimeError> {
    sink.send(msg.encode()?).await
}
