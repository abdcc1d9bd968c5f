//! Timestamp format used by the API: `YYYY-MM-DD HH:MM:SS.fff`, local to the
//! account (no offset).

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serializer};

const API_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Renders a timestamp the way the API expects it in bodies and filters.
pub fn format_timestamp(value: &NaiveDateTime) -> String {
    value.format(API_FORMAT).to_string()
}

/// Parses the API timestamp format and the ISO 8601 variants it may return.
///
/// Values with an explicit offset keep their wall-clock time; date-only values
/// resolve to midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();

    for format in NAIVE_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(parsed);
        }
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.naive_local());
    }

    if let Ok(parsed) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(parsed.naive_local());
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// `#[serde(with = "crate::datetime::option")]` for `Option<NaiveDateTime>` fields.
pub mod option {
    use super::{Deserialize, Deserializer, NaiveDateTime, Serializer, format_timestamp, parse_timestamp};

    #[allow(clippy::ref_option)]
    pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(timestamp) => serializer.serialize_str(&format_timestamp(timestamp)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(text) => parse_timestamp(text)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{text}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime};

    use super::{format_timestamp, parse_timestamp};

    fn at(hour: u32, minute: u32, second: u32, milli: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .and_then(|date| date.and_hms_milli_opt(hour, minute, second, milli))
            .expect("valid timestamp")
    }

    #[test]
    fn parses_api_format() {
        assert_eq!(parse_timestamp("2024-03-15 10:20:30.456"), Some(at(10, 20, 30, 456)));
        assert_eq!(parse_timestamp("2024-03-15 10:20:30"), Some(at(10, 20, 30, 0)));
        assert_eq!(parse_timestamp("2024-03-15 10:20"), Some(at(10, 20, 0, 0)));
    }

    #[test]
    fn parses_iso_variants() {
        assert_eq!(parse_timestamp("2024-03-15T10:20:30"), Some(at(10, 20, 30, 0)));
        assert_eq!(parse_timestamp("2024-03-15T10:20:30+03:00"), Some(at(10, 20, 30, 0)));
        assert_eq!(parse_timestamp("2024-03-15"), Some(at(0, 0, 0, 0)));
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn formats_with_milliseconds() {
        assert_eq!(format_timestamp(&at(9, 5, 1, 7)), "2024-03-15 09:05:01.007");
    }
}
