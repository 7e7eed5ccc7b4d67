//! Validation for the `[topics]` and `[typing]` sections.

use crate::schema::RogsConfig;

use super::helpers::validate_range;

pub(crate) fn validate_topics(errors: &mut Vec<String>, config: &RogsConfig) {
    let topics = &config.topics;
    for (name, prefix) in [
        ("topics.chat", &topics.chat),
        ("topics.typing", &topics.typing),
        ("topics.signal", &topics.signal),
    ] {
        if prefix.is_empty() {
            errors.push(format!("{name} is empty"));
        } else if prefix.contains(':') || prefix.contains(char::is_whitespace) {
            errors.push(format!("{name} = {prefix} must not contain ':' or whitespace"));
        }
    }

    if topics.signal == topics.chat || topics.signal == topics.typing {
        errors.push(format!(
            "topics.signal = {} must differ from the chat and typing prefixes",
            topics.signal
        ));
    }
}

pub(crate) fn validate_typing(errors: &mut Vec<String>, config: &RogsConfig) {
    validate_range(errors, "typing.idle_timeout_ms", config.typing.idle_timeout_ms, 250, 60_000);
}
