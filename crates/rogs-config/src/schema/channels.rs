//! Channel topic and typing-indicator configuration types.

use serde::{Deserialize, Serialize};

/// Topic prefix per channel kind. A channel's topic is `<prefix>:<room_id>`.
///
/// Chat and typing share `room` by default; point `typing` at another
/// prefix to give typing indicators their own namespace.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TopicConfig {
    pub chat: String,
    pub typing: String,
    pub signal: String,
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self {
            chat: "room".into(),
            typing: "room".into(),
            signal: "signal".into(),
        }
    }
}

/// Typing indicator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TypingConfig {
    /// Idle time after the last input before `typing_stop` is sent
    /// (valid range: 250-60000).
    pub idle_timeout_ms: u32,
}

impl Default for TypingConfig {
    fn default() -> Self {
        Self {
            idle_timeout_ms: 3000,
        }
    }
}
