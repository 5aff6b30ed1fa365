use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use chrono_english::{parse_date_string, Dialect};
use chrono_tz::Tz;
use moriminder_core::recurrence::RecurrencePattern;

/// Parses an RFC 3339 timestamp or a natural-language date ("tomorrow 5pm",
/// "next friday") read on the wall clock of `tz`, relative to `base`.
pub fn parse_date(input: &str, base: DateTime<Utc>, tz: &Tz) -> Result<DateTime<Utc>> {
    if let Ok(exact) = DateTime::parse_from_rfc3339(input.trim()) {
        return Ok(exact.with_timezone(&Utc));
    }

    parse_date_string(input, base.with_timezone(tz), Dialect::Us)
        .map(|local| local.with_timezone(&Utc))
        .map_err(|e| anyhow!("Failed to parse date '{}': {}", input, e))
}

pub fn parse_optional_date(
    input: Option<&str>,
    base: DateTime<Utc>,
    tz: &Tz,
) -> Result<Option<DateTime<Utc>>> {
    input.map(|s| parse_date(s, base, tz)).transpose()
}

/// Accepts the short text form or the stored JSON shape of a pattern.
pub fn parse_pattern(input: &str) -> Result<RecurrencePattern> {
    if input.trim_start().starts_with('{') {
        return Ok(RecurrencePattern::from_legacy_json(input)?);
    }
    Ok(input.parse::<RecurrencePattern>()?)
}
