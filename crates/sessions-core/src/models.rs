use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;

use crate::time_utils::{format_session_timestamp, serialize_session_timestamp};

/// Maximum number of characters of the original chunk kept on a skipped record.
pub const RAW_EXCERPT_CHARS: usize = 300;

/// One balanced `{...}` substring of the input stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawChunk<'a> {
    /// 1-based position of the chunk in extraction order.
    pub ordinal: usize,
    /// The chunk text, from the opening brace to its matching close inclusive.
    pub text: &'a str,
}

/// A validated event record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    pub user_id: i64,
    /// Absolute instant, normalised to UTC.
    pub event_time: DateTime<Utc>,
    pub event_type: String,
    /// Ordinal of the chunk this event was decoded from.
    #[serde(rename = "event_index")]
    pub source_index: usize,
}

impl Event {
    /// Identity used for duplicate detection: `(user_id, whole second, event_type)`.
    pub fn dedup_key(&self) -> (i64, i64, &str) {
        (self.user_id, self.event_time.timestamp(), self.event_type.as_str())
    }
}

// ── SkipReason ────────────────────────────────────────────────────────────────

/// Why an extracted chunk did not become an [`Event`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The chunk is not a well-formed JSON object.
    StructuredDecode(String),
    /// One of the required keys is absent.
    MissingKey(&'static str),
    /// `user_id` is present but cannot be coerced to an integer.
    BadUserId(String),
    /// `event_time` is present but not a string.
    EventTimeNotString,
    /// `event_time` is blank after trimming.
    EventTimeEmpty,
    /// `event_time` is not a recognisable ISO-8601 date-time.
    InvalidIso8601(String),
}

impl SkipReason {
    /// Fixed-vocabulary classification, without the per-record detail.
    pub fn code(&self) -> &'static str {
        match self {
            SkipReason::StructuredDecode(_) => "structured_decode_error",
            SkipReason::MissingKey(_) => "missing_key_or_bad_schema",
            SkipReason::BadUserId(_) => "bad_user_id",
            SkipReason::EventTimeNotString => "event_time not a string",
            SkipReason::EventTimeEmpty => "event_time empty",
            SkipReason::InvalidIso8601(_) => "invalid ISO-8601",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::StructuredDecode(detail)
            | SkipReason::BadUserId(detail)
            | SkipReason::InvalidIso8601(detail) => write!(f, "{}: {}", self.code(), detail),
            SkipReason::MissingKey(key) => write!(f, "{}: '{}'", self.code(), key),
            SkipReason::EventTimeNotString | SkipReason::EventTimeEmpty => {
                f.write_str(self.code())
            }
        }
    }
}

impl Serialize for SkipReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ── SkippedRecord ─────────────────────────────────────────────────────────────

/// A chunk that failed validation, with the reason it was dropped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRecord {
    #[serde(rename = "event")]
    pub source_index: usize,
    pub reason: SkipReason,
    /// Leading part of the original chunk text.
    #[serde(rename = "raw")]
    pub raw_excerpt: String,
    /// Raw field values, present when the chunk decoded and held every key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_time: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_type: Option<Value>,
}

impl SkippedRecord {
    /// Build a record with no partially extracted fields.
    pub fn new(chunk: &RawChunk<'_>, reason: SkipReason) -> Self {
        Self {
            source_index: chunk.ordinal,
            reason,
            raw_excerpt: excerpt(chunk.text),
            user_id: None,
            event_time: None,
            event_type: None,
        }
    }

    /// Attach the raw values of the three required fields.
    pub fn with_fields(mut self, user_id: &Value, event_time: &Value, event_type: &Value) -> Self {
        self.user_id = Some(user_id.clone());
        self.event_time = Some(event_time.clone());
        self.event_type = Some(event_type.clone());
        self
    }
}

/// Truncate `text` to at most [`RAW_EXCERPT_CHARS`] characters.
pub fn excerpt(text: &str) -> String {
    match text.char_indices().nth(RAW_EXCERPT_CHARS) {
        Some((cut, _)) => text[..cut].to_string(),
        None => text.to_string(),
    }
}

// ── Session ───────────────────────────────────────────────────────────────────

/// Time span and event count of one user's deduplicated events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub user_id: i64,
    #[serde(serialize_with = "serialize_session_timestamp")]
    pub session_start: DateTime<Utc>,
    #[serde(serialize_with = "serialize_session_timestamp")]
    pub session_end: DateTime<Utc>,
    pub event_count: usize,
}

impl Session {
    /// Start a session from a user's first event.
    pub fn from_event(event: &Event) -> Self {
        Self {
            user_id: event.user_id,
            session_start: event.event_time,
            session_end: event.event_time,
            event_count: 1,
        }
    }

    /// Widen the span to include `event` and count it.
    pub fn add_event(&mut self, event: &Event) {
        self.session_start = self.session_start.min(event.event_time);
        self.session_end = self.session_end.max(event.event_time);
        self.event_count += 1;
    }

    /// `session_start` in the `YYYY-MM-DDTHH:MM:SSZ` output format.
    pub fn start_display(&self) -> String {
        format_session_timestamp(&self.session_start)
    }

    /// `session_end` in the `YYYY-MM-DDTHH:MM:SSZ` output format.
    pub fn end_display(&self) -> String {
        format_session_timestamp(&self.session_end)
    }
}

// ── Stats ─────────────────────────────────────────────────────────────────────

/// Summary counts of one pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    /// Number of chunks extracted from the input.
    pub total_events: usize,
    /// Events that passed validation, counted before deduplication.
    pub valid_events: usize,
    pub skipped_events: usize,
    pub duplicates_removed: usize,
    pub unique_users: usize,
}

impl Stats {
    /// Stats as ordered `(name, value)` pairs, for console output.
    pub fn entries(&self) -> [(&'static str, usize); 5] {
        [
            ("total_events", self.total_events),
            ("valid_events", self.valid_events),
            ("skipped_events", self.skipped_events),
            ("duplicates_removed", self.duplicates_removed),
            ("unique_users", self.unique_users),
        ]
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
