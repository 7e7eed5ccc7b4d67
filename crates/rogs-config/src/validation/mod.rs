//! Full configuration validation.
//!
//! Each section has its own submodule; this orchestrator calls them all
//! and collects errors into a single `ConfigError`.

mod channels;
mod helpers;
mod realtime;

#[cfg(test)]
mod tests;

use crate::schema::RogsConfig;
use rogs_common::ConfigError;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &RogsConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    realtime::validate_realtime(&mut errors, config);
    channels::validate_topics(&mut errors, config);
    channels::validate_typing(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}
