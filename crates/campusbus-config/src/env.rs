//! Environment variable overrides applied on top of the TOML file.

use campusbus_common::ConfigError;

use crate::schema::CampusBusConfig;

pub const ENV_BROADCAST_HOST: &str = "CAMPUSBUS_BROADCAST_HOST";
pub const ENV_BROADCAST_PORT: &str = "CAMPUSBUS_BROADCAST_PORT";
pub const ENV_BROADCAST_KEY: &str = "CAMPUSBUS_BROADCAST_KEY";
pub const ENV_BROADCAST_SECURE: &str = "CAMPUSBUS_BROADCAST_SECURE";
pub const ENV_API_BASE_URL: &str = "CAMPUSBUS_API_BASE_URL";
pub const ENV_API_TOKEN: &str = "CAMPUSBUS_API_TOKEN";

/// Apply overrides from the process environment.
pub fn apply_process_env(config: &mut CampusBusConfig) -> Result<(), ConfigError> {
    apply_env_overrides(config, |name| std::env::var(name).ok())
}

/// Apply overrides using `lookup` to resolve variable names.
///
/// Unset variables leave the config untouched. Values that fail to parse
/// are reported instead of being silently ignored.
pub fn apply_env_overrides<F>(config: &mut CampusBusConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = lookup(ENV_BROADCAST_HOST) {
        config.broadcast.host = host;
    }
    if let Some(port) = lookup(ENV_BROADCAST_PORT) {
        config.broadcast.port = port.trim().parse().map_err(|e| ConfigError::EnvError {
            name: ENV_BROADCAST_PORT.into(),
            message: format!("{port:?} is not a port number: {e}"),
        })?;
    }
    if let Some(key) = lookup(ENV_BROADCAST_KEY) {
        config.broadcast.app_key = key;
    }
    if let Some(secure) = lookup(ENV_BROADCAST_SECURE) {
        // Anything other than "true" means plain ws, as the mobile app did.
        config.broadcast.secure = secure.trim().eq_ignore_ascii_case("true");
    }
    if let Some(url) = lookup(ENV_API_BASE_URL) {
        config.api.base_url = url;
    }
    if let Some(token) = lookup(ENV_API_TOKEN) {
        config.api.token = token;
    }
    Ok(())
}
