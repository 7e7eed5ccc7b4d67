//! Configuration schema types for rogs.
//!
//! All structs use `serde(default)` so partial configs work correctly.

mod channels;
mod realtime;
mod system;

pub use channels::*;
pub use realtime::*;
pub use system::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration for rogs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RogsConfig {
    pub realtime: RealtimeSettings,
    pub topics: TopicConfig,
    pub typing: TypingConfig,
    pub logging: LoggingConfig,
}
