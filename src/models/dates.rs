//! Lenient ISO-8601 date decoding.
//!
//! Servers send plain `YYYY-MM-DD` dates, but some endpoints echo full
//! RFC 3339 timestamps. Both decode to the calendar date in UTC.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer};

/// Parses a date or an RFC 3339 timestamp into a calendar date.
pub(crate) fn parse(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(trimmed)
                .ok()
                .map(|stamp| stamp.naive_utc().date())
        })
}

/// Serde adapter for [`parse`].
pub(crate) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid ISO-8601 date: {raw}")))
}
