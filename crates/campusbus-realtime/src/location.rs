//! Bus location payloads published on the location channel.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier that the backend may send as a number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Number(i64),
    Text(String),
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Number(n) => write!(f, "{n}"),
            EntityId::Text(s) => write!(f, "{s}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// The driver account that reported the position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusUser {
    #[serde(default)]
    pub id: Option<EntityId>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusInfo {
    #[serde(default)]
    pub bus_id: Option<EntityId>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub route_id: Option<EntityId>,
}

/// `{ location, user, additional }` as broadcast by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationPayload {
    pub location: Coordinates,
    #[serde(default)]
    pub user: Option<BusUser>,
    pub additional: BusInfo,
}

impl LocationPayload {
    /// Typed view of a payload handed to a connection's message handler.
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(value)
    }

    /// Whether a decoded payload has the location frame's shape.
    pub fn is_location_shaped(value: &Value) -> bool {
        value.get("location").is_some() && value.get("additional").is_some()
    }

    /// Identity of the bus: `additional.bus_id`, falling back to `user.id`.
    pub fn bus_key(&self) -> Option<&EntityId> {
        self.additional
            .bus_id
            .as_ref()
            .or_else(|| self.user.as_ref().and_then(|u| u.id.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_full_payload() {
        let value = json!({
            "location": { "latitude": -6.7134, "longitude": -79.9084 },
            "user": { "id": 7, "name": "Driver" },
            "additional": { "bus_id": 3, "status": "en_route", "route_id": "R1" }
        });
        let payload = LocationPayload::from_value(&value).unwrap();
        assert_eq!(payload.location.latitude, -6.7134);
        assert_eq!(payload.additional.status.as_deref(), Some("en_route"));
        assert_eq!(payload.additional.route_id, Some(EntityId::Text("R1".into())));
        assert_eq!(payload.bus_key(), Some(&EntityId::Number(3)));
    }

    #[test]
    fn bus_key_falls_back_to_user_id() {
        let value = json!({
            "location": { "latitude": 1.0, "longitude": 2.0 },
            "user": { "id": "u-9", "name": "x" },
            "additional": {}
        });
        let payload = LocationPayload::from_value(&value).unwrap();
        assert_eq!(payload.bus_key(), Some(&EntityId::Text("u-9".into())));
    }

    #[test]
    fn bus_key_absent_without_any_id() {
        let value = json!({
            "location": { "latitude": 1.0, "longitude": 2.0 },
            "additional": { "status": "idle" }
        });
        let payload = LocationPayload::from_value(&value).unwrap();
        assert_eq!(payload.bus_key(), None);
    }

    #[test]
    fn missing_coordinates_is_an_error() {
        let value = json!({ "location": { "latitude": 1.0 }, "additional": {} });
        assert!(LocationPayload::from_value(&value).is_err());
    }

    #[test]
    fn location_shape_needs_both_keys() {
        assert!(LocationPayload::is_location_shaped(&json!({ "location": 1, "additional": 2 })));
        assert!(!LocationPayload::is_location_shaped(&json!({ "location": 1 })));
        assert!(!LocationPayload::is_location_shaped(&json!("location")));
    }

    #[test]
    fn entity_id_display() {
        assert_eq!(EntityId::Number(7).to_string(), "7");
        assert_eq!(EntityId::Text("bus-7".into()).to_string(), "bus-7");
    }
}
