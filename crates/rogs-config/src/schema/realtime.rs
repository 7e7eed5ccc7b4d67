//! Transport and connection settings.

use serde::{Deserialize, Serialize};

/// Realtime transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RealtimeSettings {
    /// Socket endpoint, without the trailing `/websocket` segment.
    pub endpoint: String,
    /// Heartbeat interval in seconds (valid range: 5-300).
    pub heartbeat_interval_secs: u32,
    /// Handshake timeout in seconds (valid range: 1-120).
    pub connect_timeout_secs: u32,
    /// Reconnect base delay in seconds (valid range: 1-60).
    pub reconnect_delay_secs: u32,
    /// Reconnect delay ceiling in seconds.
    pub max_reconnect_delay_secs: u32,
    /// Consecutive failed attempts before the connection is given up.
    pub max_reconnect_attempts: u32,
    /// Seconds to wait for a join acknowledgment (valid range: 1-120).
    pub join_timeout_secs: u32,
}

impl Default for RealtimeSettings {
    fn default() -> Self {
        Self {
            endpoint: "ws://localhost:4000/socket".into(),
            heartbeat_interval_secs: 30,
            connect_timeout_secs: 15,
            reconnect_delay_secs: 1,
            max_reconnect_delay_secs: 30,
            max_reconnect_attempts: 10,
            join_timeout_secs: 10,
        }
    }
}
