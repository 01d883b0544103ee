use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

/// One generated sample, alive only long enough to be rendered and sent.
#[derive(Debug, Clone, PartialEq)]
pub struct BroadcastEvent {
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub source_label: String,
    pub value: f64,
}

impl BroadcastEvent {
    /// ISO-8601 UTC instant with millisecond precision, e.g. `2024-01-01T00:00:00.000Z`.
    pub fn timestamp_iso(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Template payload: `count`, `timestamp`, `sensor`, `value`.
    pub fn payload(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("count".into(), Value::from(self.sequence));
        map.insert("timestamp".into(), Value::from(self.timestamp_iso()));
        map.insert("sensor".into(), Value::from(self.source_label.clone()));
        map.insert("value".into(), Value::from(self.value));
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn payload_exposes_template_keys() {
        let event = BroadcastEvent {
            sequence: 7,
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 5).unwrap(),
            source_label: "sensor1".into(),
            value: 21.02,
        };
        let payload = event.payload();
        assert_eq!(payload["count"], 7);
        assert_eq!(payload["timestamp"], "2024-03-01T12:00:05.000Z");
        assert_eq!(payload["sensor"], "sensor1");
        assert_eq!(payload["value"], 21.02);
    }
}
