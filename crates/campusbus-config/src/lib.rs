//! Configuration for the campus bus tracker.
//!
//! Provides TOML-based configuration with environment overrides and
//! validation. All config sections use defaults so partial configs
//! work out of the box.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use campusbus_config::load_config;
//!
//! let config = load_config(None).expect("failed to load config");
//! println!("{}", config.broadcast.host);
//! ```

pub mod env;
pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{CampusBusConfig, CONFIG_SCHEMA_VERSION};

use std::path::Path;

use campusbus_common::ConfigError;

/// Load, override and validate the config.
///
/// Reads `path` when given, otherwise the platform default path (creating
/// a commented template there when missing). `CAMPUSBUS_*` environment
/// variables are applied before validation.
pub fn load_config(path: Option<&Path>) -> Result<CampusBusConfig, ConfigError> {
    let mut config = match path {
        Some(path) => toml_loader::load_from_path(path)?,
        None => toml_loader::load_default()?,
    };

    env::apply_process_env(&mut config)?;
    validation::validate(&config)?;
    Ok(config)
}

/// Serialize a config to a pretty-printed JSON string with the bearer
/// token masked.
pub fn config_to_json(config: &CampusBusConfig) -> String {
    let mut shown = config.clone();
    if !shown.api.token.is_empty() {
        shown.api.token = "[REDACTED]".into();
    }
    serde_json::to_string_pretty(&shown)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}
