//! Configuration schema types for the bus tracker.
//!
//! All structs use `serde(default)` so partial configs work correctly.

mod api;
mod broadcast;
mod system;

pub use api::*;
pub use broadcast::*;
pub use system::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration.
///
/// Only override what you want to change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct CampusBusConfig {
    pub broadcast: BroadcastConfig,
    pub api: ApiConfig,
    pub reconnect: ReconnectConfig,
    pub logging: LoggingConfig,
}
