//! ISO-8601 parsing and the fixed timestamp formats used in output tables.

use std::sync::OnceLock;

use chrono::{
    DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeZone, Utc,
};
use regex::{Captures, Regex};
use serde::Serializer;
use thiserror::Error;

/// Output format of session boundaries (second precision, UTC).
pub const SESSION_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

// ── Errors ────────────────────────────────────────────────────────────────────

/// Why a string was rejected as an ISO-8601 date-time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Iso8601Error {
    /// The text does not match any accepted layout.
    #[error("invalid isoformat string: '{0}'")]
    Layout(String),

    /// The layout matched but a component is out of range.
    #[error("{0}")]
    OutOfRange(&'static str),
}

// ── Parsing ───────────────────────────────────────────────────────────────────

fn iso_regex() -> &'static Regex {
    static ISO_REGEX: OnceLock<Regex> = OnceLock::new();
    ISO_REGEX.get_or_init(|| {
        Regex::new(
            r"(?x)^
            (?P<year>[0-9]{4})
            (?: -(?P<month>[0-9]{2})-(?P<day>[0-9]{2}) | (?P<bmonth>[0-9]{2})(?P<bday>[0-9]{2}) )
            (?:
                [T\x20]
                (?P<hour>[0-9]{2})
                (?:
                    :(?P<minute>[0-9]{2})
                    (?: :(?P<second>[0-9]{2}) (?: [.,](?P<frac>[0-9]{1,9}) )? )?
                  |
                    (?P<bminute>[0-9]{2})
                    (?: (?P<bsecond>[0-9]{2}) (?: [.,](?P<bfrac>[0-9]{1,9}) )? )?
                )?
                (?:
                    (?P<sign>[+-])(?P<off_h>[0-9]{2})
                    (?: :?(?P<off_m>[0-9]{2}) (?: :?(?P<off_s>[0-9]{2}) )? )?
                )?
            )?
            $",
        )
        .expect("regex is valid")
    })
}

/// Parse an ISO-8601 calendar date-time.
///
/// Accepts `YYYY-MM-DD` / `YYYYMMDD`, optionally followed by `T` or a space
/// and a time (`HH`, `HH:MM`, `HH:MM:SS[.f]`, or the basic `HHMMSS[.f]`
/// forms) and an optional `±HH[:MM[:SS]]` offset. Values without an offset
/// are taken as UTC. A trailing `Z` is not accepted here; callers normalise
/// it to `+00:00` first.
pub fn parse_iso8601(text: &str) -> Result<DateTime<Utc>, Iso8601Error> {
    let caps = iso_regex()
        .captures(text)
        .ok_or_else(|| Iso8601Error::Layout(text.to_string()))?;

    let date = parse_date(&caps)?;
    let time = parse_time(&caps)?;
    let naive = NaiveDateTime::new(date, time);

    match parse_offset(&caps)? {
        Some(offset) => offset
            .from_local_datetime(&naive)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or(Iso8601Error::OutOfRange("date-time out of range")),
        None => Ok(Utc.from_utc_datetime(&naive)),
    }
}

fn number(caps: &Captures<'_>, names: &[&str]) -> Option<u32> {
    names
        .iter()
        .find_map(|name| caps.name(name))
        .and_then(|m| m.as_str().parse().ok())
}

fn parse_date(caps: &Captures<'_>) -> Result<NaiveDate, Iso8601Error> {
    let year = number(caps, &["year"]).unwrap_or(0);
    let month = number(caps, &["month", "bmonth"]).unwrap_or(0);
    let day = number(caps, &["day", "bday"]).unwrap_or(0);

    if year == 0 {
        return Err(Iso8601Error::OutOfRange("year 0 is out of range"));
    }
    if !(1..=12).contains(&month) {
        return Err(Iso8601Error::OutOfRange("month must be in 1..12"));
    }
    NaiveDate::from_ymd_opt(year as i32, month, day)
        .ok_or(Iso8601Error::OutOfRange("day is out of range for month"))
}

fn parse_time(caps: &Captures<'_>) -> Result<NaiveTime, Iso8601Error> {
    let hour = number(caps, &["hour"]).unwrap_or(0);
    let minute = number(caps, &["minute", "bminute"]).unwrap_or(0);
    let second = number(caps, &["second", "bsecond"]).unwrap_or(0);

    // Right-pad the fraction to nanoseconds: ".5" is 500ms.
    let nanos = ["frac", "bfrac"]
        .iter()
        .find_map(|name| caps.name(name))
        .map(|m| {
            let digits = m.as_str();
            digits.parse::<u32>().unwrap_or(0) * 10u32.pow(9 - digits.len() as u32)
        })
        .unwrap_or(0);

    if hour > 23 {
        return Err(Iso8601Error::OutOfRange("hour must be in 0..23"));
    }
    if minute > 59 {
        return Err(Iso8601Error::OutOfRange("minute must be in 0..59"));
    }
    if second > 59 {
        return Err(Iso8601Error::OutOfRange("second must be in 0..59"));
    }
    NaiveTime::from_hms_nano_opt(hour, minute, second, nanos)
        .ok_or(Iso8601Error::OutOfRange("time component out of range"))
}

fn parse_offset(caps: &Captures<'_>) -> Result<Option<FixedOffset>, Iso8601Error> {
    let Some(sign) = caps.name("sign") else {
        return Ok(None);
    };

    let hours = number(caps, &["off_h"]).unwrap_or(0);
    let minutes = number(caps, &["off_m"]).unwrap_or(0);
    let seconds = number(caps, &["off_s"]).unwrap_or(0);
    if minutes > 59 || seconds > 59 {
        return Err(Iso8601Error::OutOfRange("offset component out of range"));
    }

    let total = (hours * 3600 + minutes * 60 + seconds) as i32;
    if total >= 86_400 {
        return Err(Iso8601Error::OutOfRange(
            "offset must be strictly between -24h and +24h",
        ));
    }

    let signed = if sign.as_str() == "-" { -total } else { total };
    FixedOffset::east_opt(signed)
        .map(Some)
        .ok_or(Iso8601Error::OutOfRange("offset out of range"))
}

// ── Formatting ────────────────────────────────────────────────────────────────

/// Format as `YYYY-MM-DDTHH:MM:SSZ`, truncating any fractional seconds.
pub fn format_session_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format(SESSION_TIMESTAMP_FORMAT).to_string()
}

/// Format as RFC 3339 in UTC, keeping fractional seconds only when present.
pub fn format_event_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// `serde` adapter writing [`format_session_timestamp`] output.
pub fn serialize_session_timestamp<S: Serializer>(
    dt: &DateTime<Utc>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&dt.format(SESSION_TIMESTAMP_FORMAT))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    // ── parse_iso8601: accepted layouts ───────────────────────────────────────

    #[test]
    fn test_parse_with_utc_offset() {
        let dt = parse_iso8601("2024-07-10T11:45:00+00:00").unwrap();
        assert_eq!(dt, utc(2024, 7, 10, 11, 45, 0));
    }

    #[test]
    fn test_parse_with_positive_offset_converts_to_utc() {
        let dt = parse_iso8601("2024-07-10T13:45:00+02:00").unwrap();
        assert_eq!(dt, utc(2024, 7, 10, 11, 45, 0));
    }

    #[test]
    fn test_parse_with_negative_compact_offset() {
        let dt = parse_iso8601("2024-07-10T06:45:00-0500").unwrap();
        assert_eq!(dt, utc(2024, 7, 10, 11, 45, 0));
    }

    #[test]
    fn test_parse_hour_only_offset() {
        let dt = parse_iso8601("2024-07-10T12:45:00+01").unwrap();
        assert_eq!(dt, utc(2024, 7, 10, 11, 45, 0));
    }

    #[test]
    fn test_parse_naive_assumes_utc() {
        let dt = parse_iso8601("2024-07-10T11:45:00").unwrap();
        assert_eq!(dt, utc(2024, 7, 10, 11, 45, 0));
    }

    #[test]
    fn test_parse_space_separator() {
        let dt = parse_iso8601("2024-07-10 11:45:00").unwrap();
        assert_eq!(dt, utc(2024, 7, 10, 11, 45, 0));
    }

    #[test]
    fn test_parse_date_only_is_midnight() {
        let dt = parse_iso8601("2024-07-10").unwrap();
        assert_eq!(dt, utc(2024, 7, 10, 0, 0, 0));
    }

    #[test]
    fn test_parse_basic_format() {
        let dt = parse_iso8601("20240710T114500").unwrap();
        assert_eq!(dt, utc(2024, 7, 10, 11, 45, 0));
    }

    #[test]
    fn test_parse_hour_and_minute_only() {
        let dt = parse_iso8601("2024-07-10T11:45").unwrap();
        assert_eq!(dt, utc(2024, 7, 10, 11, 45, 0));
    }

    #[test]
    fn test_parse_fractional_seconds() {
        let dt = parse_iso8601("2024-07-10T11:45:00.5").unwrap();
        assert_eq!(dt.nanosecond(), 500_000_000);

        let dt = parse_iso8601("2024-07-10T11:45:00.123456+00:00").unwrap();
        assert_eq!(dt.nanosecond(), 123_456_000);
    }

    // ── parse_iso8601: rejections ─────────────────────────────────────────────

    #[test]
    fn test_parse_rejects_garbage() {
        let err = parse_iso8601("bad-timestamp").unwrap_err();
        assert_eq!(err.to_string(), "invalid isoformat string: 'bad-timestamp'");
    }

    #[test]
    fn test_parse_rejects_z_suffix() {
        assert!(matches!(
            parse_iso8601("2024-07-10T11:45:00Z"),
            Err(Iso8601Error::Layout(_))
        ));
    }

    #[test]
    fn test_parse_rejects_other_separators() {
        assert_eq!(
            parse_iso8601("2024-07-10x11:45:00"),
            Err(Iso8601Error::Layout("2024-07-10x11:45:00".to_string()))
        );
    }

    #[test]
    fn test_parse_rejects_offset_without_time() {
        assert!(parse_iso8601("2024-07-10+00:00").is_err());
    }

    #[test]
    fn test_parse_rejects_impossible_day() {
        let err = parse_iso8601("2024-02-30T00:00:00").unwrap_err();
        assert_eq!(err, Iso8601Error::OutOfRange("day is out of range for month"));
    }

    #[test]
    fn test_parse_rejects_month_13() {
        let err = parse_iso8601("2024-13-01").unwrap_err();
        assert_eq!(err.to_string(), "month must be in 1..12");
    }

    #[test]
    fn test_parse_rejects_hour_24() {
        assert!(parse_iso8601("2024-07-10T24:00:00").is_err());
    }

    #[test]
    fn test_parse_rejects_full_day_offset() {
        assert!(parse_iso8601("2024-07-10T11:45:00+24:00").is_err());
    }

    #[test]
    fn test_parse_rejects_year_zero() {
        assert!(parse_iso8601("0000-01-01").is_err());
    }

    // ── Formatting ────────────────────────────────────────────────────────────

    #[test]
    fn test_format_session_timestamp_truncates_fraction() {
        let dt = parse_iso8601("2024-07-10T11:45:59.999").unwrap();
        assert_eq!(format_session_timestamp(&dt), "2024-07-10T11:45:59Z");
    }

    #[test]
    fn test_format_event_timestamp() {
        assert_eq!(
            format_event_timestamp(&utc(2024, 7, 10, 11, 45, 0)),
            "2024-07-10T11:45:00Z"
        );
        let dt = parse_iso8601("2024-07-10T11:45:00.250").unwrap();
        assert_eq!(format_event_timestamp(&dt), "2024-07-10T11:45:00.250Z");
    }
}
