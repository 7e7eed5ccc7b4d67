use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

/// Failures of the realtime connection and its channels.
///
/// Skipped pushes are deliberately absent: a push with no joined channel is
/// dropped and counted, never reported as an error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RealtimeError {
    /// A channel operation was attempted with no live connection.
    #[error("realtime connection not initialized")]
    NotInitialized,

    /// A channel failed to join (rejected, timed out, or lost its transport).
    #[error("failed to join {topic}: {reason}")]
    Join { topic: String, reason: String },

    /// Another component already holds this kind of channel for the room.
    #[error("{kind} channel for room {room_id} is already in use")]
    ChannelInUse { kind: String, room_id: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("connection closed")]
    ConnectionClosed,

    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("protocol error: {0}")]
    Protocol(String),
}

#[derive(Debug, thiserror::Error)]
pub enum RogsError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Realtime(#[from] RealtimeError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::FileNotFound(PathBuf::from("/tmp/missing.toml"));
        assert_eq!(err.to_string(), "config file not found: /tmp/missing.toml");

        let err = ConfigError::ParseError("unexpected token".into());
        assert_eq!(err.to_string(), "config parse error: unexpected token");

        let err = ConfigError::ValidationError("realtime.endpoint is empty".into());
        assert_eq!(
            err.to_string(),
            "config validation error: realtime.endpoint is empty"
        );
    }

    #[test]
    fn realtime_error_display() {
        assert_eq!(
            RealtimeError::NotInitialized.to_string(),
            "realtime connection not initialized"
        );

        let err = RealtimeError::Join {
            topic: "room:42".into(),
            reason: "unauthorized".into(),
        };
        assert_eq!(err.to_string(), "failed to join room:42: unauthorized");

        let err = RealtimeError::ChannelInUse {
            kind: "typing".into(),
            room_id: "42".into(),
        };
        assert_eq!(err.to_string(), "typing channel for room 42 is already in use");

        let err = RealtimeError::Transport("connection reset".into());
        assert_eq!(err.to_string(), "transport error: connection reset");

        assert_eq!(RealtimeError::ConnectionClosed.to_string(), "connection closed");
    }

    #[test]
    fn rogs_error_from_config() {
        let config_err = ConfigError::ParseError("bad toml".into());
        let err: RogsError = config_err.into();
        assert!(matches!(err, RogsError::Config(_)));
        assert!(err.to_string().contains("bad toml"));
    }

    #[test]
    fn rogs_error_from_realtime() {
        let err: RogsError = RealtimeError::NotInitialized.into();
        assert!(matches!(
            err,
            RogsError::Realtime(RealtimeError::NotInitialized)
        ));
    }

    #[test]
    fn rogs_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: RogsError = io_err.into();
        assert!(matches!(err, RogsError::Io(_)));
        assert!(err.to_string().contains("file missing"));
    }
}
