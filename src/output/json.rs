//! JSON serialization for measurements.

use crate::result::Measurement;

/// Serialize a Measurement to a compact JSON string.
///
/// # Errors
///
/// Returns an error if serialization fails (should not happen for Measurement).
pub fn to_json(measurement: &Measurement) -> Result<String, serde_json::Error> {
    serde_json::to_string(measurement)
}

/// Serialize a Measurement to a pretty-printed JSON string.
///
/// # Errors
///
/// Returns an error if serialization fails (should not happen for Measurement).
pub fn to_json_pretty(measurement: &Measurement) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(measurement)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ClockMultiplier, EventCounts};

    fn make_measurement(events: EventCounts) -> Measurement {
        Measurement {
            ticks: 1_048_576,
            iterations: 512,
            multiplier: ClockMultiplier::new(0.25).unwrap(),
            clock: "rdtsc".to_string(),
            events,
        }
    }

    #[test]
    fn test_json_fields() {
        let json = to_json(&make_measurement(EventCounts::default())).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["ticks"], 1_048_576);
        assert_eq!(value["iterations"], 512);
        assert_eq!(value["multiplier"], 0.25);
        assert_eq!(value["clock"], "rdtsc");
        assert!(value.get("events").is_none());
    }

    #[test]
    fn test_json_includes_active_events() {
        let m = make_measurement(EventCounts {
            c1: Some(77),
            c2: None,
        });
        let pretty = to_json_pretty(&m).unwrap();
        let back: Measurement = serde_json::from_str(&pretty).unwrap();
        assert_eq!(back, m);
        assert!(pretty.contains("\"c1\": 77"));
    }
}
