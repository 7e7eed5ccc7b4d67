//! Runtime configuration, connection state, and counters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use rogs_common::RealtimeError;
use serde::Serialize;

use crate::channel::TopicNames;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const MIN_PERIOD: Duration = Duration::from_secs(1);

/// Settings for one realtime client.
#[derive(Debug, Clone)]
pub struct RealtimeConfig {
    /// Socket endpoint without the `/websocket` suffix
    /// (e.g. `wss://chat.example.com/socket`).
    pub endpoint: String,
    pub heartbeat_interval_secs: u64,
    pub connect_timeout_secs: u64,
    /// Reconnect base delay in seconds. Doubles per failed attempt.
    pub reconnect_delay_secs: u64,
    pub max_reconnect_delay_secs: u64,
    /// Consecutive failed attempts before the connection is given up for good.
    pub max_reconnect_attempts: u32,
    pub join_timeout_secs: u64,
    pub typing_idle_timeout_ms: u64,
    pub topics: TopicNames,
    /// Capacity of the broadcast [`EventBus`](crate::EventBus).
    pub event_capacity: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            endpoint: "ws://localhost:4000/socket".into(),
            heartbeat_interval_secs: 30,
            connect_timeout_secs: 15,
            reconnect_delay_secs: 1,
            max_reconnect_delay_secs: 30,
            max_reconnect_attempts: 10,
            join_timeout_secs: 10,
            typing_idle_timeout_ms: 3000,
            topics: TopicNames::default(),
            event_capacity: 256,
        }
    }
}

impl RealtimeConfig {
    /// Build the WebSocket URL, carrying the auth token as `_csrf_token`.
    pub fn ws_url(&self, auth_token: &str) -> Result<String, RealtimeError> {
        let mut url = url::Url::parse(&self.endpoint)
            .map_err(|e| RealtimeError::InvalidEndpoint(format!("{}: {e}", self.endpoint)))?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(RealtimeError::InvalidEndpoint(format!(
                "{}: scheme must be ws or wss",
                self.endpoint
            )));
        }
        url.path_segments_mut()
            .map_err(|_| RealtimeError::InvalidEndpoint(self.endpoint.clone()))?
            .pop_if_empty()
            .push("websocket");
        url.query_pairs_mut()
            .append_pair("_csrf_token", auth_token)
            .append_pair("vsn", "1.0.0");
        Ok(url.into())
    }

    // Zero-valued timings are raised to MIN_PERIOD: `interval` panics on a
    // zero period and a zero backoff would spin.

    pub(crate) fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs).max(MIN_PERIOD)
    }

    pub(crate) fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs).max(MIN_PERIOD)
    }

    pub(crate) fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs).max(MIN_PERIOD)
    }

    pub(crate) fn max_reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.max_reconnect_delay_secs).max(self.reconnect_delay())
    }

    pub(crate) fn join_timeout(&self) -> Duration {
        Duration::from_secs(self.join_timeout_secs)
    }

    pub(crate) fn typing_idle_timeout(&self) -> Duration {
        Duration::from_millis(self.typing_idle_timeout_ms)
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    /// Reconnect attempts exhausted. The connection will not recover.
    Errored,
}

impl ConnectionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ConnectionState::Errored)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Errored => "errored",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Counters for one connection.
#[derive(Debug, Default)]
pub struct ConnectionStats {
    connect_attempts: AtomicU64,
    pushes_sent: AtomicU64,
    pushes_skipped: AtomicU64,
}

impl ConnectionStats {
    pub fn connect_attempts(&self) -> u64 {
        self.connect_attempts.load(Ordering::Relaxed)
    }

    /// Pushes written to the transport.
    pub fn pushes_sent(&self) -> u64 {
        self.pushes_sent.load(Ordering::Relaxed)
    }

    /// Pushes dropped because their channel was not joined or absent.
    pub fn pushes_skipped(&self) -> u64 {
        self.pushes_skipped.load(Ordering::Relaxed)
    }

    pub(crate) fn record_connect_attempt(&self) {
        self.connect_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_sent(&self) {
        self.pushes_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_skipped(&self) {
        self.pushes_skipped.fetch_add(1, Ordering::Relaxed);
    }
}
