//! Configuration, Pusher wire types, and status enums for the channel client.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Pusher protocol revision announced in the socket URL.
pub const PROTOCOL_VERSION: u8 = 7;
/// Client name and version announced in the socket URL.
pub const CLIENT_NAME: &str = "js";
pub const CLIENT_VERSION: &str = "8.4.0-rc2";

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Reconnect-on-drop policy. `enabled: false` means a dropped socket ends
/// the connection with a `Failed` status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub enabled: bool,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl ReconnectPolicy {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_attempts: None,
        }
    }
}

/// Configuration for connecting to a Pusher-compatible broadcaster.
#[derive(Clone)]
pub struct ChannelClientConfig {
    pub host: String,
    pub port: u16,
    pub app_key: String,
    /// Use `wss` instead of `ws`.
    pub secure: bool,
    /// Keep-alive ping interval (default: 25s).
    pub heartbeat_interval: Duration,
    /// Upper bound on opening the socket.
    pub connect_timeout: Duration,
    /// Also forward frames whose payload carries `location` and
    /// `additional`, whatever their event name.
    pub match_location_shape: bool,
    pub reconnect: ReconnectPolicy,
}

impl std::fmt::Debug for ChannelClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelClientConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("app_key", &"[REDACTED]")
            .field("secure", &self.secure)
            .field("heartbeat_interval", &self.heartbeat_interval)
            .field("connect_timeout", &self.connect_timeout)
            .field("match_location_shape", &self.match_location_shape)
            .field("reconnect", &self.reconnect)
            .finish()
    }
}

impl Default for ChannelClientConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6001,
            app_key: String::new(),
            secure: false,
            heartbeat_interval: Duration::from_secs(25),
            connect_timeout: Duration::from_secs(15),
            match_location_shape: true,
            reconnect: ReconnectPolicy::default(),
        }
    }
}

impl ChannelClientConfig {
    fn scheme(&self) -> &'static str {
        if self.secure {
            "wss"
        } else {
            "ws"
        }
    }

    /// Build the broadcaster socket URL.
    pub(crate) fn ws_url(&self) -> String {
        format!(
            "{}://{}:{}/app/{}?protocol={PROTOCOL_VERSION}&client={CLIENT_NAME}&version={CLIENT_VERSION}&flash=false",
            self.scheme(),
            self.host,
            self.port,
            self.app_key
        )
    }

    /// The socket URL for logs: app key masked, no query string.
    pub(crate) fn log_url(&self) -> String {
        format!(
            "{}://{}:{}/app/[REDACTED]",
            self.scheme(),
            self.host,
            self.port
        )
    }
}

// ---------------------------------------------------------------------------
// Pusher Protocol Types
// ---------------------------------------------------------------------------

/// Event names of the Pusher control protocol.
pub mod events {
    pub const CONNECTION_ESTABLISHED: &str = "pusher:connection_established";
    pub const SUBSCRIPTION_SUCCEEDED: &str = "pusher_internal:subscription_succeeded";
    pub const SUBSCRIBE: &str = "pusher:subscribe";
    pub const PING: &str = "pusher:ping";
    pub const PONG: &str = "pusher:pong";
    pub const ERROR: &str = "pusher:error";
}

/// A Pusher protocol frame.
///
/// `data` arrives either as an object or as a JSON-encoded string; the
/// handler normalizes it before use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PusherMessage {
    pub event: String,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub data: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
}

impl PusherMessage {
    fn control(event: &str, data: serde_json::Value) -> Self {
        Self {
            event: event.to_string(),
            data,
            channel: None,
        }
    }

    pub fn ping() -> Self {
        Self::control(events::PING, serde_json::json!({}))
    }

    pub fn pong() -> Self {
        Self::control(events::PONG, serde_json::json!({}))
    }

    pub fn subscribe(channel: &str, auth: &str) -> Self {
        Self::control(
            events::SUBSCRIBE,
            serde_json::json!({ "channel": channel, "auth": auth }),
        )
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Connection progress as seen by the owner of a `ConnectionHandle`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// Opening the socket or waiting for the broadcaster's socket id.
    Connecting,
    /// Socket id known, channel authorization in flight.
    Authorizing,
    /// The broadcaster confirmed the channel subscription.
    Subscribed,
    /// Waiting `delay` before reconnect attempt number `attempt`.
    Reconnecting { attempt: u32, delay: Duration },
    /// No messages will arrive until the client connects again.
    Failed(String),
    /// `disconnect()` completed or the client was dropped.
    Closed,
}

/// Handshake progress of a single socket. The connection task not running
/// stands for the idle and closed states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HandshakeState {
    SocketOpen,
    SocketIdReceived,
    ChannelAuthorized,
    Subscribed,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(secure: bool) -> ChannelClientConfig {
        ChannelClientConfig {
            host: "ws.bus.example.edu".into(),
            port: 6001,
            app_key: "campus-key".into(),
            secure,
            ..Default::default()
        }
    }

    #[test]
    fn ws_url_plain() {
        assert_eq!(
            config(false).ws_url(),
            "ws://ws.bus.example.edu:6001/app/campus-key?protocol=7&client=js&version=8.4.0-rc2&flash=false"
        );
    }

    #[test]
    fn ws_url_secure_uses_wss() {
        assert!(config(true).ws_url().starts_with("wss://ws.bus.example.edu:6001/app/"));
    }

    #[test]
    fn log_url_masks_app_key() {
        let url = config(false).log_url();
        assert_eq!(url, "ws://ws.bus.example.edu:6001/app/[REDACTED]");
        assert!(!url.contains("campus-key"));
        assert!(!config(true).log_url().contains("campus-key"));
    }

    #[test]
    fn debug_redacts_app_key() {
        let debug = format!("{:?}", config(false));
        assert!(!debug.contains("campus-key"));
    }

    #[test]
    fn ping_serializes_with_empty_data() {
        let json = serde_json::to_value(PusherMessage::ping()).unwrap();
        assert_eq!(json, serde_json::json!({ "event": "pusher:ping", "data": {} }));
    }

    #[test]
    fn subscribe_serializes_channel_and_auth() {
        let json = serde_json::to_value(PusherMessage::subscribe("private-LocationChannel", "sig"))
            .unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "event": "pusher:subscribe",
                "data": { "channel": "private-LocationChannel", "auth": "sig" }
            })
        );
    }

    #[test]
    fn frame_without_data_deserializes() {
        let msg: PusherMessage = serde_json::from_str(r#"{"event":"pusher:pong"}"#).unwrap();
        assert_eq!(msg.event, "pusher:pong");
        assert!(msg.data.is_null());
        assert!(msg.channel.is_none());
    }
}
