//! Logging configuration types.

use serde::{Deserialize, Serialize};

/// Log level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// `tracing` filter directive for the rogs crates at this level.
    pub fn directive(self) -> &'static str {
        match self {
            LogLevel::Trace => "rogs=trace",
            LogLevel::Debug => "rogs=debug",
            LogLevel::Info => "rogs=info",
            LogLevel::Warning => "rogs=warn",
            LogLevel::Error => "rogs=error",
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
}
