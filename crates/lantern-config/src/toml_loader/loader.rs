//! Reading config files from disk.

use std::io::ErrorKind;
use std::path::Path;

use lantern_common::ConfigError;
use tracing::{info, warn};

use super::paths::{create_default_config, default_config_path};
use crate::schema::LanternConfig;
use crate::validation;

/// Parse a TOML config file.
///
/// Missing fields take serde defaults. Out-of-range values only produce a
/// warning here; callers that must reject them validate afterwards.
pub fn load_from_path(path: &Path) -> Result<LanternConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ConfigError::FileNotFound(path.to_path_buf()),
        _ => ConfigError::ParseError(format!("failed to read {}: {e}", path.display())),
    })?;

    let config: LanternConfig = toml::from_str(&content)
        .map_err(|e| ConfigError::ParseError(format!("invalid TOML in {}: {e}", path.display())))?;

    if let Err(e) = validation::validate(&config) {
        warn!(path = %path.display(), "config has out-of-range values: {e}");
    }

    info!(path = %path.display(), "config loaded");
    Ok(config)
}

/// Load `<config_dir>/lantern/config.toml`, writing the commented template
/// and returning defaults the first time.
pub fn load_default() -> Result<LanternConfig, ConfigError> {
    let path = default_config_path()?;
    if !path.exists() {
        info!(path = %path.display(), "no config file yet, writing template");
        create_default_config(&path)?;
        return Ok(LanternConfig::default());
    }
    load_from_path(&path)
}
