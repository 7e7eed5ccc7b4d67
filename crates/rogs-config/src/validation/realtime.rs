//! Validation for the `[realtime]` section.

use crate::schema::RogsConfig;

use super::helpers::validate_range;

pub(crate) fn validate_realtime(errors: &mut Vec<String>, config: &RogsConfig) {
    let rt = &config.realtime;

    let endpoint = rt.endpoint.trim();
    if endpoint.is_empty() {
        errors.push("realtime.endpoint is empty".into());
    } else if !(endpoint.starts_with("ws://") || endpoint.starts_with("wss://")) {
        errors.push(format!(
            "realtime.endpoint = {endpoint} must use the ws:// or wss:// scheme"
        ));
    }

    validate_range(errors, "realtime.heartbeat_interval_secs", rt.heartbeat_interval_secs, 5, 300);
    validate_range(errors, "realtime.connect_timeout_secs", rt.connect_timeout_secs, 1, 120);
    validate_range(errors, "realtime.reconnect_delay_secs", rt.reconnect_delay_secs, 1, 60);
    validate_range(
        errors,
        "realtime.max_reconnect_delay_secs",
        rt.max_reconnect_delay_secs,
        rt.reconnect_delay_secs,
        600,
    );
    validate_range(errors, "realtime.max_reconnect_attempts", rt.max_reconnect_attempts, 1, 1000);
    validate_range(errors, "realtime.join_timeout_secs", rt.join_timeout_secs, 1, 120);
}
