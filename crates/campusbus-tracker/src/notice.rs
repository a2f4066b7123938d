//! Service event notices published on the events channel.

use serde::Deserialize;
use serde_json::Value;

pub const EVENTS_CHANNEL: &str = "private-EventChannel";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Severity {
    #[serde(rename = "L")]
    Low,
    #[serde(rename = "M")]
    Medium,
    #[serde(rename = "H")]
    High,
    #[serde(rename = "C")]
    Critical,
}

/// A safety or service notice. Only `name` is required; the rest is shown
/// when present.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServiceNotice {
    #[serde(default)]
    pub id: Option<Value>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub severity: Option<Severity>,
    #[serde(default)]
    pub start_at: Option<String>,
    #[serde(default)]
    pub expires_at: Option<String>,
}

impl ServiceNotice {
    /// Accepts the notice itself or a `{ "event": notice }` wrapper.
    pub fn from_value(value: &Value) -> Option<Self> {
        let inner = value.get("event").filter(|v| v.is_object()).unwrap_or(value);
        Self::deserialize(inner).ok()
    }

    pub fn is_urgent(&self) -> bool {
        matches!(self.severity, Some(Severity::High | Severity::Critical))
    }
}

/// Counts notices so the operator gets a summary on exit.
#[derive(Debug, Default)]
pub struct NoticeLog {
    received: u64,
    urgent: u64,
    last: Option<String>,
}

impl NoticeLog {
    /// Record one payload. Returns the parsed notice when it has one.
    pub fn record(&mut self, payload: &Value) -> Option<ServiceNotice> {
        self.received += 1;
        let notice = ServiceNotice::from_value(payload)?;
        if notice.is_urgent() {
            self.urgent += 1;
        }
        self.last = Some(notice.name.clone());
        Some(notice)
    }

    pub fn received(&self) -> u64 {
        self.received
    }

    pub fn urgent(&self) -> u64 {
        self.urgent
    }

    pub fn last(&self) -> Option<&str> {
        self.last.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_notice_with_severity_code() {
        let notice = ServiceNotice::from_value(&json!({
            "id": "9b1c",
            "name": "Road closed",
            "description": "Detour via north gate",
            "severity": "C",
            "start_at": "2026-03-01T08:00:00Z",
            "expires_at": "2026-03-01T12:00:00Z"
        }))
        .unwrap();
        assert_eq!(notice.severity, Some(Severity::Critical));
        assert!(notice.is_urgent());
    }

    #[test]
    fn unwraps_event_envelope() {
        let notice =
            ServiceNotice::from_value(&json!({ "event": { "name": "Delay", "severity": "L" } }))
                .unwrap();
        assert_eq!(notice.name, "Delay");
        assert!(!notice.is_urgent());
    }

    #[test]
    fn unknown_payload_is_counted_but_not_parsed() {
        let mut log = NoticeLog::default();
        assert!(log.record(&json!({ "refresh": true })).is_none());
        assert!(log.record(&json!({ "name": "Storm", "severity": "H" })).is_some());
        assert_eq!(log.received(), 2);
        assert_eq!(log.urgent(), 1);
        assert_eq!(log.last(), Some("Storm"));
    }

    #[test]
    fn unknown_severity_code_is_rejected() {
        assert!(ServiceNotice::from_value(&json!({ "name": "x", "severity": "Z" })).is_none());
    }
}
