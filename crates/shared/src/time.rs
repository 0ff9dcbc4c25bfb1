//! Timestamp (de)serialization tolerant of offset-less values.
//!
//! The backend emits naive ISO-8601 timestamps (`datetime.utcnow()` with no
//! offset designator), which the stock `DateTime<Utc>` deserializer rejects.
//! These helpers accept both forms, treating a naive timestamp as UTC, and
//! always serialize with an explicit offset.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serializer};

pub fn parse(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => Ok(dt.with_timezone(&Utc)),
        Err(_) => raw.parse::<NaiveDateTime>().map(|naive| naive.and_utc()),
    }
}

/// For `DateTime<Utc>` fields: `#[serde(with = "crate::time::utc")]`.
pub mod utc {
    use super::*;

    pub fn serialize<S>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&dt.to_rfc3339())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// For `Option<DateTime<Utc>>` fields: combine with `#[serde(default)]`.
pub mod utc_opt {
    use super::*;

    pub fn serialize<S>(dt: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match dt {
            Some(dt) => serializer.serialize_some(&dt.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|r| parse(&r).map_err(serde::de::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_naive_timestamps_as_utc() {
        let dt = parse("2026-08-26T12:00:00.123456").unwrap();
        assert_eq!(
            dt,
            Utc.with_ymd_and_hms(2026, 8, 26, 12, 0, 0).unwrap()
                + chrono::Duration::microseconds(123_456)
        );
    }

    #[test]
    fn parses_offset_bearing_timestamps() {
        let zulu = parse("2026-08-26T12:00:00Z").unwrap();
        let offset = parse("2026-08-26T14:00:00+02:00").unwrap();
        assert_eq!(zulu, offset);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse("yesterday-ish").is_err());
    }
}
