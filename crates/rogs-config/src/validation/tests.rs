//! Tests for the full validation pipeline.

use super::*;
use crate::schema::*;

#[test]
fn default_config_validates() {
    assert!(validate(&RogsConfig::default()).is_ok());
}

#[test]
fn catches_empty_endpoint() {
    let mut config = RogsConfig::default();
    config.realtime.endpoint = "  ".into();
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("realtime.endpoint is empty"));
}

#[test]
fn catches_http_endpoint() {
    let mut config = RogsConfig::default();
    config.realtime.endpoint = "http://localhost:4000/socket".into();
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("ws:// or wss://"));
}

#[test]
fn catches_heartbeat_too_small() {
    let mut config = RogsConfig::default();
    config.realtime.heartbeat_interval_secs = 1;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("realtime.heartbeat_interval_secs"));
}

#[test]
fn catches_max_delay_below_base_delay() {
    let mut config = RogsConfig::default();
    config.realtime.reconnect_delay_secs = 10;
    config.realtime.max_reconnect_delay_secs = 5;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("realtime.max_reconnect_delay_secs"));
}

#[test]
fn catches_zero_reconnect_attempts() {
    let mut config = RogsConfig::default();
    config.realtime.max_reconnect_attempts = 0;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("realtime.max_reconnect_attempts"));
}

#[test]
fn catches_topic_prefix_with_colon() {
    let mut config = RogsConfig::default();
    config.topics.chat = "room:".into();
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("topics.chat"));
}

#[test]
fn catches_signal_sharing_chat_prefix() {
    let mut config = RogsConfig::default();
    config.topics.signal = "room".into();
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("topics.signal"));
}

#[test]
fn separate_typing_prefix_is_allowed() {
    let mut config = RogsConfig::default();
    config.topics.typing = "typing".into();
    assert!(validate(&config).is_ok());
}

#[test]
fn catches_typing_timeout_out_of_range() {
    let mut config = RogsConfig::default();
    config.typing.idle_timeout_ms = 100_000;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("typing.idle_timeout_ms"));
}

#[test]
fn collects_multiple_errors() {
    let mut config = RogsConfig::default();
    config.realtime.join_timeout_secs = 0;
    config.typing.idle_timeout_ms = 0;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("realtime.join_timeout_secs"));
    assert!(err.contains("typing.idle_timeout_ms"));
    assert!(err.contains("; "));
}
