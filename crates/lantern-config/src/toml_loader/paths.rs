//! Where the config file lives.

use std::path::{Path, PathBuf};

use lantern_common::ConfigError;
use tracing::info;

use super::template::default_config_toml;

const APP_DIR: &str = "lantern";
const FILE_NAME: &str = "config.toml";

/// `~/.config/lantern/config.toml` on Linux, the Application Support
/// equivalent on macOS.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR).join(FILE_NAME))
        .ok_or_else(|| ConfigError::ParseError("no platform config directory".into()))
}

/// Write the template to `path`, creating missing parent directories.
pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
    let write_err = |e: std::io::Error| {
        ConfigError::ParseError(format!("cannot write {}: {e}", path.display()))
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    std::fs::write(path, default_config_toml()).map_err(write_err)?;

    info!(path = %path.display(), "wrote default config");
    Ok(())
}
