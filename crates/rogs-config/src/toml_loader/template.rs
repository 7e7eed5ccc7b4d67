//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> String {
    r##"# rogs realtime configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[realtime]
# endpoint = "ws://localhost:4000/socket"
# heartbeat_interval_secs = 30     # 5-300
# connect_timeout_secs = 15        # 1-120
# reconnect_delay_secs = 1         # 1-60
# max_reconnect_delay_secs = 30    # >= reconnect_delay_secs, <= 600
# max_reconnect_attempts = 10      # 1-1000
# join_timeout_secs = 10           # 1-120

[topics]
# Topic is "<prefix>:<room_id>". Chat and typing share "room" by default.
# chat = "room"
# typing = "room"
# signal = "signal"

[typing]
# idle_timeout_ms = 3000           # 250-60000

[logging]
# level = "INFO"                   # TRACE, DEBUG, INFO, WARNING, ERROR
"##
    .to_string()
}
