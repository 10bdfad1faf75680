//! Timestamp parsing and formatting.
//!
//! Two textual forms are in play:
//!
//! - **W3C** (`2024-01-01T00:00:00+00:00`): seconds precision with a numeric
//!   offset. Used for everything persisted (state file, event metadata).
//!   Parsing accepts any RFC 3339 value, including `Z` and fractional seconds.
//! - **UTC Zulu** (`2024-01-01T00:00:00Z`): what the Markwhen renderer prints.

use chrono::{DateTime, FixedOffset, SecondsFormat, SubsecRound, Utc};

/// Timestamp type used throughout whenline.
pub type Timestamp = DateTime<FixedOffset>;

/// Parse an RFC 3339 / W3C timestamp.
pub fn parse_w3c(value: &str) -> Result<Timestamp, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value)
}

/// Format as W3C with seconds precision and a numeric offset.
#[must_use]
pub fn format_w3c(value: &Timestamp) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Drop sub-second precision, leaving exactly what [`format_w3c`] keeps.
#[must_use]
pub fn truncate_to_seconds(value: Timestamp) -> Timestamp {
    value.trunc_subsecs(0)
}

/// Format in UTC with a trailing `Z`, seconds precision.
#[must_use]
pub fn format_utc<Tz: chrono::TimeZone>(value: &DateTime<Tz>) -> String {
    value
        .with_timezone(&Utc)
        .format("%Y-%m-%dT%H:%M:%SZ")
        .to_string()
}

/// Current time as a [`Timestamp`] in UTC.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now().fixed_offset()
}

/// Serde adapter that stores a [`Timestamp`] in W3C form.
///
/// Use with `#[serde(with = "whenline_core::timestamp::w3c")]`.
pub mod w3c {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{Timestamp, format_w3c, parse_w3c, truncate_to_seconds};

    /// Serialize as a W3C string.
    pub fn serialize<S: Serializer>(value: &Timestamp, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_w3c(value))
    }

    /// Deserialize from any RFC 3339 string, truncated to whole seconds.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Timestamp, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_w3c(&raw)
            .map(truncate_to_seconds)
            .map_err(serde::de::Error::custom)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
