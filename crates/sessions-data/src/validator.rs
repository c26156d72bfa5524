//! Decoding and validation of extracted chunks into [`Event`]s.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sessions_core::models::{Event, RawChunk, SkipReason, SkippedRecord};
use sessions_core::time_utils::parse_iso8601;

/// Keys every record must carry, in the order they are checked.
pub const REQUIRED_KEYS: [&str; 3] = ["user_id", "event_time", "event_type"];

// ── Public API ────────────────────────────────────────────────────────────────

/// Turn one chunk into an [`Event`], or explain why it was skipped.
///
/// Checks run in a fixed order: JSON decode, required keys, `event_time`,
/// then `user_id` coercion. Skips after the key check carry the raw values
/// of all three fields.
pub fn validate_chunk(chunk: &RawChunk<'_>) -> Result<Event, SkippedRecord> {
    let object = decode_object(chunk.text)
        .map_err(|reason| SkippedRecord::new(chunk, reason))?;

    let [user_id, event_time, event_type] = required_fields(&object)
        .map_err(|reason| SkippedRecord::new(chunk, reason))?;

    let skip = |reason: SkipReason| {
        SkippedRecord::new(chunk, reason).with_fields(user_id, event_time, event_type)
    };

    let timestamp = parse_event_time(event_time).map_err(skip)?;
    let user = coerce_user_id(user_id).map_err(|detail| skip(SkipReason::BadUserId(detail)))?;

    Ok(Event {
        user_id: user,
        event_time: timestamp,
        event_type: coerce_event_type(event_type),
        source_index: chunk.ordinal,
    })
}

/// Apply the `event_time` rules: must be a non-blank string, a trailing `Z`
/// means `+00:00`, and a value without an offset is UTC.
pub fn parse_event_time(value: &Value) -> Result<DateTime<Utc>, SkipReason> {
    let Value::String(raw) = value else {
        return Err(SkipReason::EventTimeNotString);
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(SkipReason::EventTimeEmpty);
    }

    let normalised = match trimmed.strip_suffix('Z') {
        Some(stripped) => format!("{}+00:00", stripped),
        None => trimmed.to_string(),
    };

    parse_iso8601(&normalised).map_err(|e| SkipReason::InvalidIso8601(e.to_string()))
}

/// Coerce a JSON value to an integer user id.
///
/// Integers pass through, finite floats truncate toward zero, booleans map
/// to 0/1 and strings must trim to a signed decimal integer.
pub fn coerce_user_id(value: &Value) -> Result<i64, String> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(i)
            } else if n.is_u64() {
                Err(format!("integer {} out of range", n))
            } else {
                let f = n.as_f64().unwrap_or(f64::NAN);
                // i64::MAX as f64 rounds up to 2^63, which is itself out of range.
                if f.is_finite() && f >= i64::MIN as f64 && f < i64::MAX as f64 {
                    Ok(f.trunc() as i64)
                } else {
                    Err(format!("number {} out of range", n))
                }
            }
        }
        Value::Bool(b) => Ok(i64::from(*b)),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| format!("invalid literal for integer: '{}'", s)),
        Value::Null => Err("null is not an integer".to_string()),
        Value::Array(_) => Err("expected an integer, got an array".to_string()),
        Value::Object(_) => Err("expected an integer, got an object".to_string()),
    }
}

/// Coerce a JSON value to the event type string.
///
/// Strings are used as-is; any other value becomes its compact JSON text.
pub fn coerce_event_type(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn decode_object(text: &str) -> Result<Map<String, Value>, SkipReason> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(SkipReason::StructuredDecode(
            "expected a JSON object".to_string(),
        )),
        Err(e) => Err(SkipReason::StructuredDecode(e.to_string())),
    }
}

fn required_fields(object: &Map<String, Value>) -> Result<[&Value; 3], SkipReason> {
    let field = |key: &'static str| object.get(key).ok_or(SkipReason::MissingKey(key));
    Ok([
        field(REQUIRED_KEYS[0])?,
        field(REQUIRED_KEYS[1])?,
        field(REQUIRED_KEYS[2])?,
    ])
}

// ── Tests ─────────────────────────────────────────────────────────────────────
