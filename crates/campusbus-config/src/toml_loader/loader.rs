use std::path::{Path, PathBuf};

use campusbus_common::ConfigError;
use tracing::{debug, info};

use super::template::default_config_toml;
use crate::schema::CampusBusConfig;

const APP_DIR: &str = "campusbus";
const FILE_NAME: &str = "config.toml";

/// `<platform config dir>/campusbus/config.toml`.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR).join(FILE_NAME))
        .ok_or_else(|| ConfigError::ParseError("no platform config directory".into()))
}

/// Parse the file at `path`. Missing fields take their defaults; validation
/// happens after env overrides are applied.
pub fn load_from_path(path: &Path) -> Result<CampusBusConfig, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }
        Err(e) => {
            return Err(ConfigError::ParseError(format!(
                "cannot read {}: {e}",
                path.display()
            )))
        }
    };

    let config = toml::from_str::<CampusBusConfig>(&content)
        .map_err(|e| ConfigError::ParseError(format!("{}: {e}", path.display())))?;
    debug!(path = %path.display(), "Config file loaded");
    Ok(config)
}

/// Load the default config file, writing the commented template there
/// first if it does not exist yet.
pub fn load_default() -> Result<CampusBusConfig, ConfigError> {
    let path = default_config_path()?;
    match load_from_path(&path) {
        Err(ConfigError::FileNotFound(_)) => {
            create_default_config(&path)?;
            Ok(CampusBusConfig::default())
        }
        other => other,
    }
}

/// Write the commented template to `path`, creating parent directories.
pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
    let write_error =
        |e: std::io::Error| ConfigError::ParseError(format!("cannot write {}: {e}", path.display()));

    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(write_error)?;
    }
    std::fs::write(path, default_config_toml()).map_err(write_error)?;
    info!(path = %path.display(), "Wrote default config template");
    Ok(())
}
