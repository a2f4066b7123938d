//! Full configuration validation.
//!
//! Each section has its own check; this orchestrator calls them all
//! and collects errors into a single `ConfigError`.

mod helpers;


use crate::schema::CampusBusConfig;
use campusbus_common::ConfigError;

use helpers::{validate_not_empty, validate_range};

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &CampusBusConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_broadcast(&mut errors, config);
    validate_api(&mut errors, config);
    validate_reconnect(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

fn validate_broadcast(errors: &mut Vec<String>, config: &CampusBusConfig) {
    let broadcast = &config.broadcast;
    validate_not_empty(errors, "broadcast.host", &broadcast.host);
    validate_not_empty(errors, "broadcast.app_key", &broadcast.app_key);
    validate_not_empty(errors, "broadcast.channel", &broadcast.channel);
    if broadcast.port == 0 {
        errors.push("broadcast.port must not be 0".into());
    }
    validate_range(
        errors,
        "broadcast.heartbeat_interval_secs",
        broadcast.heartbeat_interval_secs,
        5,
        300,
    );
    validate_range(
        errors,
        "broadcast.connect_timeout_secs",
        broadcast.connect_timeout_secs,
        1,
        120,
    );
}

fn validate_api(errors: &mut Vec<String>, config: &CampusBusConfig) {
    let api = &config.api;
    validate_not_empty(errors, "api.base_url", &api.base_url);
    if !api.base_url.trim().is_empty()
        && !(api.base_url.starts_with("http://") || api.base_url.starts_with("https://"))
    {
        errors.push(format!(
            "api.base_url = {:?} must start with http:// or https://",
            api.base_url
        ));
    }
    if !api.broadcast_auth_path.starts_with('/') {
        errors.push(format!(
            "api.broadcast_auth_path = {:?} must start with '/'",
            api.broadcast_auth_path
        ));
    }
}

fn validate_reconnect(errors: &mut Vec<String>, config: &CampusBusConfig) {
    let reconnect = &config.reconnect;
    if reconnect.base_delay_ms == 0 {
        errors.push("reconnect.base_delay_ms must be greater than 0".into());
    }
    if reconnect.max_delay_ms < reconnect.base_delay_ms {
        errors.push(format!(
            "reconnect.max_delay_ms = {} is below reconnect.base_delay_ms = {}",
            reconnect.max_delay_ms, reconnect.base_delay_ms
        ));
    }
}
