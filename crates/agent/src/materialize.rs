//! Record materializer: calendar service payloads → canonical [`Event`]s.

use lifechat_core::error::RecordError;
use lifechat_core::record::{Event, parse_local_timestamp};
use serde_json::Value;

/// Tag attached to every event that came from the calendar.
pub const CALENDAR_TAG: &str = "calendar";

/// Convert a calendar event payload into an [`Event`].
///
/// Accepts the event object itself or the service envelope `{data: {...}}`.
/// `start`/`end` may be `{dateTime}`, `{date}` (all-day) or a plain string;
/// any UTC offset is stripped, not applied. `summary` becomes both the
/// description and the name.
pub fn calendar_payload_to_event(payload: &Value) -> Result<Event, RecordError> {
    let event = match payload.get("data") {
        Some(inner) if inner.is_object() => inner,
        _ => payload,
    };
    if !event.is_object() {
        return Err(RecordError::Materialization(
            "calendar payload is not an object".into(),
        ));
    }

    let summary = event
        .get("summary")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim();
    let start = boundary(event, "start")?;
    let end = boundary(event, "end")?;

    Event::new(start, end, summary, vec![CALENDAR_TAG.to_string()], summary)
}

fn boundary(event: &Value, field: &str) -> Result<chrono::NaiveDateTime, RecordError> {
    let raw = match event.get(field) {
        Some(Value::String(s)) => Some(s.as_str()),
        Some(obj @ Value::Object(_)) => obj
            .get("dateTime")
            .or_else(|| obj.get("date"))
            .and_then(Value::as_str),
        _ => None,
    };
    let raw = raw.ok_or_else(|| {
        RecordError::Materialization(format!("missing '{field}.dateTime' in calendar payload"))
    })?;
    parse_local_timestamp(raw)
        .map_err(|e| RecordError::Materialization(format!("'{field}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn google_event() -> Value {
        json!({
            "id": "evt_123",
            "status": "confirmed",
            "summary": "Dinner with friends",
            "start": {"dateTime": "2025-06-15T19:00:00+02:00", "timeZone": "Europe/Berlin"},
            "end": {"dateTime": "2025-06-15T21:00:00+02:00", "timeZone": "Europe/Berlin"}
        })
    }

    #[test]
    fn maps_summary_and_strips_offset() {
        let event = calendar_payload_to_event(&google_event()).unwrap();
        assert_eq!(event.name, "Dinner with friends");
        assert_eq!(event.description, event.name);
        assert_eq!(event.tags, vec!["calendar"]);
        assert_eq!(event.start_time.to_string(), "2025-06-15 19:00:00");
        assert_eq!(event.end_time.to_string(), "2025-06-15 21:00:00");
        assert_eq!(event.date.to_string(), "2025-06-15");
    }

    #[test]
    fn unwraps_service_envelope() {
        let wrapped = json!({"success": true, "data": google_event()});
        assert_eq!(
            calendar_payload_to_event(&wrapped).unwrap(),
            calendar_payload_to_event(&google_event()).unwrap()
        );
    }

    #[test]
    fn is_idempotent() {
        let payload = google_event();
        let first = calendar_payload_to_event(&payload).unwrap();
        let second = calendar_payload_to_event(&payload).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn all_day_event_starts_at_midnight() {
        let payload = json!({
            "summary": "Holiday",
            "start": {"date": "2025-06-20"},
            "end": {"date": "2025-06-21"}
        });
        let event = calendar_payload_to_event(&payload).unwrap();
        assert_eq!(event.start_time.to_string(), "2025-06-20 00:00:00");
    }

    #[test]
    fn missing_start_is_a_materialization_error() {
        let payload = json!({"summary": "Broken", "end": {"dateTime": "2025-06-15T10:00:00Z"}});
        let err = calendar_payload_to_event(&payload).unwrap_err();
        assert!(matches!(err, RecordError::Materialization(ref m) if m.contains("start")));
    }

    #[test]
    fn unparseable_time_is_a_materialization_error() {
        let payload = json!({
            "summary": "Broken",
            "start": {"dateTime": "soon"},
            "end": {"dateTime": "2025-06-15T10:00:00Z"}
        });
        assert!(matches!(
            calendar_payload_to_event(&payload),
            Err(RecordError::Materialization(_))
        ));
    }

    #[test]
    fn non_object_payload_is_rejected() {
        assert!(calendar_payload_to_event(&json!("evt_123")).is_err());
    }
}
