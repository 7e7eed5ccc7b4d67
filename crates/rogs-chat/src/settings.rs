//! Mapping from the config file to runtime settings.

use rogs_config::{LoggingConfig, RogsConfig};
use rogs_realtime::{RealtimeConfig, TopicNames};

/// Runtime realtime settings from the loaded config, with an optional
/// endpoint override from the command line.
pub fn realtime_config(config: &RogsConfig, endpoint: Option<&str>) -> RealtimeConfig {
    let realtime = &config.realtime;
    RealtimeConfig {
        endpoint: endpoint
            .map(str::to_string)
            .unwrap_or_else(|| realtime.endpoint.clone()),
        heartbeat_interval_secs: realtime.heartbeat_interval_secs.into(),
        connect_timeout_secs: realtime.connect_timeout_secs.into(),
        reconnect_delay_secs: realtime.reconnect_delay_secs.into(),
        max_reconnect_delay_secs: realtime.max_reconnect_delay_secs.into(),
        max_reconnect_attempts: realtime.max_reconnect_attempts,
        join_timeout_secs: realtime.join_timeout_secs.into(),
        typing_idle_timeout_ms: config.typing.idle_timeout_ms.into(),
        topics: TopicNames {
            chat: config.topics.chat.clone(),
            typing: config.topics.typing.clone(),
            signal: config.topics.signal.clone(),
        },
        ..RealtimeConfig::default()
    }
}

/// `tracing` filter directive. A bare level from the command line applies to
/// the rogs crates; anything else is used as a directive verbatim.
pub fn log_directive(cli: Option<&str>, logging: &LoggingConfig) -> String {
    match cli {
        Some(level) => match level.to_ascii_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {
                format!("rogs={}", level.to_ascii_lowercase())
            }
            "warning" => "rogs=warn".to_string(),
            _ => level.to_string(),
        },
        None => logging.level.directive().to_string(),
    }
}
