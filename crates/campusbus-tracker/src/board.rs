//! Live bus markers keyed by bus identity.

use std::collections::HashMap;

use campusbus_realtime::{Coordinates, EntityId, LocationPayload};

/// Outcome of folding one location update into the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Updated,
}

/// One bus as the map would draw it.
#[derive(Debug, Clone, PartialEq)]
pub struct BusMarker {
    pub bus: EntityId,
    pub position: Coordinates,
    pub driver: Option<String>,
    pub status: Option<String>,
    pub updates: u64,
}

/// Latest known position of every bus, in first-seen order.
#[derive(Debug, Default)]
pub struct BusBoard {
    index: HashMap<EntityId, usize>,
    markers: Vec<BusMarker>,
}

impl BusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the marker for the payload's bus, or append a new one.
    /// Payloads without any bus identity are ignored.
    pub fn upsert(&mut self, payload: &LocationPayload) -> Option<Upsert> {
        let bus = payload.bus_key()?.clone();
        let driver = payload.user.as_ref().and_then(|u| u.name.clone());

        if let Some(&slot) = self.index.get(&bus) {
            let marker = &mut self.markers[slot];
            marker.position = payload.location;
            marker.driver = driver;
            marker.status = payload.additional.status.clone();
            marker.updates += 1;
            return Some(Upsert::Updated);
        }

        self.index.insert(bus.clone(), self.markers.len());
        self.markers.push(BusMarker {
            bus,
            position: payload.location,
            driver,
            status: payload.additional.status.clone(),
            updates: 1,
        });
        Some(Upsert::Inserted)
    }

    pub fn markers(&self) -> &[BusMarker] {
        &self.markers
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(bus_id: serde_json::Value, lat: f64, lng: f64) -> LocationPayload {
        LocationPayload::from_value(&json!({
            "location": { "latitude": lat, "longitude": lng },
            "user": { "id": 99, "name": "Driver" },
            "additional": { "bus_id": bus_id, "status": "en_route" }
        }))
        .unwrap()
    }

    #[test]
    fn first_update_inserts() {
        let mut board = BusBoard::new();
        assert!(board.is_empty());
        assert_eq!(board.upsert(&payload(json!(1), 1.0, 2.0)), Some(Upsert::Inserted));
        assert_eq!(board.len(), 1);
        assert_eq!(board.markers()[0].driver.as_deref(), Some("Driver"));
    }

    #[test]
    fn repeated_bus_moves_in_place() {
        let mut board = BusBoard::new();
        board.upsert(&payload(json!(1), 1.0, 2.0));
        board.upsert(&payload(json!(2), 3.0, 4.0));
        assert_eq!(board.upsert(&payload(json!(1), 5.0, 6.0)), Some(Upsert::Updated));

        let markers = board.markers();
        assert_eq!(markers.len(), 2);
        assert_eq!(markers[0].bus, EntityId::Number(1));
        assert_eq!(markers[0].position.latitude, 5.0);
        assert_eq!(markers[0].updates, 2);
        assert_eq!(markers[1].bus, EntityId::Number(2));
    }

    #[test]
    fn numeric_and_text_ids_are_distinct_buses() {
        let mut board = BusBoard::new();
        board.upsert(&payload(json!(1), 1.0, 2.0));
        assert_eq!(board.upsert(&payload(json!("1"), 1.0, 2.0)), Some(Upsert::Inserted));
        assert_eq!(board.len(), 2);
    }

    #[test]
    fn payload_without_identity_is_ignored() {
        let mut board = BusBoard::new();
        let anonymous = LocationPayload::from_value(&json!({
            "location": { "latitude": 1.0, "longitude": 2.0 },
            "additional": {}
        }))
        .unwrap();
        assert_eq!(board.upsert(&anonymous), None);
        assert!(board.is_empty());
    }
}
