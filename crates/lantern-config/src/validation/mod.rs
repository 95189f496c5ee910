//! Full configuration validation.
//!
//! Each section has its own validator; this orchestrator calls them all
//! and collects errors into a single `ConfigError`.

mod ai;
mod helpers;


use crate::schema::LanternConfig;
use lantern_common::ConfigError;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &LanternConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    ai::validate_ai(&mut errors, config);
    ai::validate_engine(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}
