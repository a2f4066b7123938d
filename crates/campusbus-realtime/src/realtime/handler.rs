//! Classification of inbound Pusher frames.

use serde_json::Value;

use super::types::{events, PusherMessage};
use crate::location::LocationPayload;

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

/// What the connection task should do with one inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Inbound {
    ConnectionEstablished { socket_id: String },
    SubscriptionSucceeded { channel: Option<String> },
    Ping,
    Pong,
    Error { code: Option<u16>, message: String },
    /// Payload for the caller's handler.
    Deliver(Value),
    /// Location-shaped payload under a foreign event name while shape
    /// matching is off.
    ShapeMismatch { event: String },
    Unrecognized { event: String },
    Malformed(String),
}

/// Decode a string `data` field that holds JSON. Strings that are not JSON
/// are kept as they are.
pub(crate) fn normalize_data(data: Value) -> Value {
    match data {
        Value::String(raw) => serde_json::from_str(&raw).unwrap_or(Value::String(raw)),
        other => other,
    }
}

// ---------------------------------------------------------------------------
// Event Matching
// ---------------------------------------------------------------------------

/// Decides which application frames reach the caller.
#[derive(Debug, Clone)]
pub(crate) struct EventMatcher {
    event: String,
    match_location_shape: bool,
}

/// Laravel relabels events as `App\Events\Name` or `.Name`.
fn short_event_name(event: &str) -> &str {
    event.rsplit(|c| c == '\\' || c == '.').next().unwrap_or(event)
}

impl EventMatcher {
    pub(crate) fn new(event: &str, match_location_shape: bool) -> Self {
        Self {
            event: event.to_string(),
            match_location_shape,
        }
    }

    pub(crate) fn matches_name(&self, event: &str) -> bool {
        if self.event.is_empty() {
            return false;
        }
        event == self.event || short_event_name(event) == short_event_name(&self.event)
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Parse one text frame and classify it.
pub(crate) fn classify_text(text: &str, matcher: &EventMatcher) -> Inbound {
    match serde_json::from_str::<PusherMessage>(text) {
        Ok(msg) => classify(msg, matcher),
        Err(e) => Inbound::Malformed(format!("undecodable frame: {e}")),
    }
}

pub(crate) fn classify(msg: PusherMessage, matcher: &EventMatcher) -> Inbound {
    let data = normalize_data(msg.data);

    match msg.event.as_str() {
        events::CONNECTION_ESTABLISHED => match data.get("socket_id").and_then(Value::as_str) {
            Some(socket_id) => Inbound::ConnectionEstablished {
                socket_id: socket_id.to_string(),
            },
            None => Inbound::Malformed("connection_established without socket_id".to_string()),
        },
        events::SUBSCRIPTION_SUCCEEDED => Inbound::SubscriptionSucceeded {
            channel: msg.channel,
        },
        events::PING => Inbound::Ping,
        events::PONG => Inbound::Pong,
        events::ERROR => Inbound::Error {
            code: data
                .get("code")
                .and_then(Value::as_u64)
                .and_then(|c| u16::try_from(c).ok()),
            message: data
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string(),
        },
        event if matcher.matches_name(event) => Inbound::Deliver(data),
        event if LocationPayload::is_location_shaped(&data) => {
            if matcher.match_location_shape {
                Inbound::Deliver(data)
            } else {
                Inbound::ShapeMismatch {
                    event: event.to_string(),
                }
            }
        }
        event => Inbound::Unrecognized {
            event: event.to_string(),
        },
    }
}

/// Pusher reserves close/error codes 4000-4099 for conditions where the
/// client must not reconnect.
pub(crate) fn is_fatal_code(code: u16) -> bool {
    (4000..=4099).contains(&code)
}
