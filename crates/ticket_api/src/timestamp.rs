//! Multi-layout timestamp parsing for Jira and Sayori payloads.
//!
//! Layouts are tried in a fixed order and the first match wins, so a given
//! input always resolves through the same layout. Inputs without any zone
//! designator are taken as UTC.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// Fractional seconds with a numeric offset, e.g. `2023-05-10T14:22:01.123+0000`.
const NUMERIC_OFFSET_LAYOUT: &str = "%Y-%m-%dT%H:%M:%S%.f%z";
/// Fractional seconds without a zone, e.g. `2023-05-10T14:22:01.123456`.
const NAIVE_LAYOUT: &str = "%Y-%m-%dT%H:%M:%S%.f";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampLayout {
    NumericOffset,
    Rfc3339,
    NaiveUtc,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized timestamp {input:?}: no accepted layout matched")]
pub struct TimestampParseError {
    pub input: String,
}

/// Parses `value`, returning the instant and the layout that accepted it.
pub fn parse_with_layout(
    value: &str,
) -> Result<(DateTime<Utc>, TimestampLayout), TimestampParseError> {
    let trimmed = value.trim();

    if let Ok(parsed) = DateTime::parse_from_str(trimmed, NUMERIC_OFFSET_LAYOUT) {
        return Ok((parsed.with_timezone(&Utc), TimestampLayout::NumericOffset));
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok((parsed.with_timezone(&Utc), TimestampLayout::Rfc3339));
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, NAIVE_LAYOUT) {
        return Ok((parsed.and_utc(), TimestampLayout::NaiveUtc));
    }

    Err(TimestampParseError {
        input: value.to_string(),
    })
}

/// Resolves `value` to a UTC instant using the first layout that accepts it.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, TimestampParseError> {
    parse_with_layout(value).map(|(instant, _)| instant)
}

pub(crate) fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}

pub(crate) fn deserialize_optional_timestamp<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.trim().is_empty() => parse_timestamp(&raw)
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}
