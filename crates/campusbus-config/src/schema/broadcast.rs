//! Broadcaster (Pusher-compatible socket server) configuration.

use serde::{Deserialize, Serialize};

/// Where the realtime socket lives and which channel to join.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BroadcastConfig {
    pub host: String,
    pub port: u16,
    pub app_key: String,
    /// Selects `wss` over `ws`.
    pub secure: bool,
    /// Keep-alive ping interval in seconds (valid range: 5-300).
    pub heartbeat_interval_secs: u32,
    /// Socket open timeout in seconds (valid range: 1-120).
    pub connect_timeout_secs: u32,
    pub channel: String,
    pub event: String,
    /// Forward frames whose data looks like a location even when the
    /// event name does not match.
    pub match_location_shape: bool,
}

impl std::fmt::Debug for BroadcastConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BroadcastConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("app_key", &"[REDACTED]")
            .field("secure", &self.secure)
            .field("heartbeat_interval_secs", &self.heartbeat_interval_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("channel", &self.channel)
            .field("event", &self.event)
            .field("match_location_shape", &self.match_location_shape)
            .finish()
    }
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 6001,
            app_key: String::new(),
            secure: false,
            heartbeat_interval_secs: 25,
            connect_timeout_secs: 15,
            channel: "private-LocationChannel".into(),
            event: "NewLocationReceived".into(),
            match_location_shape: true,
        }
    }
}
