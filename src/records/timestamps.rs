// Timestamp normalization for post records.
//
// Simulation databases store `created_at` either as clock ticks (INTEGER or
// REAL, one tick per time unit) or as a datetime string. Both are brought to
// milliseconds so the builder can subtract the root time at full resolution
// before rounding offsets to whole units.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime};

/// Datetime layouts seen in simulation exports, tried in order.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse a datetime string as UTC. Accepts RFC 3339 and the formats above.
pub fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
}

/// Milliseconds in one time unit of `unit_secs` seconds.
pub fn unit_millis(unit_secs: i64) -> Result<i64> {
    if unit_secs <= 0 {
        anyhow::bail!("Time unit must be a positive number of seconds, got {unit_secs}");
    }
    unit_secs
        .checked_mul(1000)
        .with_context(|| format!("Time unit of {unit_secs} seconds is too large"))
}

/// Clock ticks (one per time unit) in milliseconds.
pub fn ticks_to_millis(ticks: f64, unit_millis: i64) -> i64 {
    (ticks * unit_millis as f64).round() as i64
}

/// Convert a textual `created_at` into milliseconds.
///
/// A purely numeric string is taken as clock ticks, like a numeric column.
pub fn text_to_millis(text: &str, unit_millis: i64) -> Result<i64> {
    let trimmed = text.trim();
    if let Ok(ticks) = trimmed.parse::<i64>() {
        return Ok(ticks.saturating_mul(unit_millis));
    }
    if let Ok(ticks) = trimmed.parse::<f64>() {
        return Ok(ticks_to_millis(ticks, unit_millis));
    }

    let dt = parse_datetime(trimmed)
        .with_context(|| format!("Unrecognized timestamp: {trimmed:?}"))?;
    Ok(dt.and_utc().timestamp_millis())
}
