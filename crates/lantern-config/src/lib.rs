//! Lantern configuration system.
//!
//! TOML-based configuration for the sidebar assistant: which model the
//! inference engine loads, how generation is sampled, where the local
//! inference server lives, and how verbose logging is. Every section uses
//! serde defaults so partial configs work out of the box.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use lantern_config::{load_config, config_to_json};
//!
//! let config = load_config().expect("failed to load config");
//! let json = config_to_json(&config);
//! println!("{json}");
//! ```

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{LanternConfig, CONFIG_SCHEMA_VERSION};

use std::path::Path;

use lantern_common::ConfigError;

/// Load config from the platform default path.
///
/// Creates a commented default file if none exists and validates the
/// result. Unlike [`toml_loader::load_from_path`], invalid values are an
/// error here.
pub fn load_config() -> Result<LanternConfig, ConfigError> {
    let config = toml_loader::load_default()?;
    validation::validate(&config)?;
    Ok(config)
}

/// Load and validate config from an explicit path (the `--config` override).
pub fn load_config_from(path: &Path) -> Result<LanternConfig, ConfigError> {
    let config = toml_loader::load_from_path(path)?;
    validation::validate(&config)?;
    Ok(config)
}

/// Serialize a config to a pretty-printed JSON string.
pub fn config_to_json(config: &LanternConfig) -> String {
    serde_json::to_string_pretty(config)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_to_json_contains_all_sections() {
        let json = config_to_json(&LanternConfig::default());
        assert!(json.contains("\"ai\""));
        assert!(json.contains("\"engine\""));
        assert!(json.contains("\"logging\""));
    }

    #[test]
    fn config_to_json_never_leaks_api_key() {
        let mut config = LanternConfig::default();
        config.engine.api_key = Some("sk-local-secret".into());
        let json = config_to_json(&config);
        assert!(!json.contains("sk-local-secret"));
    }

    #[test]
    fn load_config_from_missing_path_is_file_not_found() {
        let err = load_config_from(Path::new("/tmp/lantern_missing_config.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn load_config_from_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[ai]\ntemperature = 9.0\n").unwrap();

        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
        assert!(err.to_string().contains("ai.temperature"));
    }

    #[test]
    fn default_config_round_trips_through_json() {
        let json = config_to_json(&LanternConfig::default());
        let parsed: LanternConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.ai.model_id, "Qwen2-0.5B-Instruct-q4f16_1-MLC");
        assert_eq!(parsed.ai.max_tokens, 1024);
    }
}
