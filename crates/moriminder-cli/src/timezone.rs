use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use moriminder_core::error::CoreError;
use moriminder_core::timezone::{parse_timezone, validate_timezone};

const COMMON_TIMEZONES: &[&str] = &[
    "UTC",
    "America/New_York",
    "America/Chicago",
    "America/Denver",
    "America/Los_Angeles",
    "America/Sao_Paulo",
    "Europe/London",
    "Europe/Paris",
    "Europe/Berlin",
    "Europe/Madrid",
    "Asia/Tokyo",
    "Asia/Seoul",
    "Asia/Shanghai",
    "Asia/Singapore",
    "Asia/Kolkata",
    "Asia/Dubai",
    "Australia/Sydney",
    "Pacific/Auckland",
];

/// Detect system timezone, falling back to UTC
pub fn detect_system_timezone() -> String {
    if let Ok(tz) = std::env::var("TZ") {
        if !tz.is_empty() && validate_timezone(&tz).is_ok() {
            return tz;
        }
    }

    if let Ok(tz) = iana_time_zone::get_timezone() {
        if validate_timezone(&tz).is_ok() {
            return tz;
        }
    }

    "UTC".to_string()
}

/// Common zones whose name overlaps the invalid input
pub fn suggest_timezone(invalid: &str) -> Vec<&'static str> {
    let needle = invalid.to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    COMMON_TIMEZONES
        .iter()
        .copied()
        .filter(|tz| {
            let name = tz.to_lowercase();
            name.contains(&needle)
                || tz
                    .split('/')
                    .any(|part| needle.contains(&part.to_lowercase()))
        })
        .take(5)
        .collect()
}

/// Resolve user input (IANA name or a common abbreviation) to a timezone
pub fn normalize_timezone_input(input: &str) -> Result<Tz, CoreError> {
    if let Ok(tz) = parse_timezone(input) {
        return Ok(tz);
    }

    let mapped = match input.to_lowercase().as_str() {
        "est" | "eastern" => "America/New_York",
        "cst" | "central" => "America/Chicago",
        "mst" | "mountain" => "America/Denver",
        "pst" | "pacific" => "America/Los_Angeles",
        "gmt" | "utc" => "UTC",
        "bst" | "london" => "Europe/London",
        "cet" | "paris" => "Europe/Paris",
        "jst" | "tokyo" => "Asia/Tokyo",
        _ => {
            let suggestions = suggest_timezone(input);
            let hint = if suggestions.is_empty() {
                "Use IANA names like 'America/New_York'".to_string()
            } else {
                format!("Did you mean: {}?", suggestions.join(", "))
            };
            return Err(CoreError::InvalidTimezone(format!(
                "Unknown timezone '{}'. {}",
                input, hint
            )));
        }
    };

    parse_timezone(mapped)
}

/// Local date, time and zone abbreviation, e.g. `2025-11-09 09:00 (EST)`
pub fn format_local(datetime: DateTime<Utc>, tz: &Tz) -> String {
    let local = datetime.with_timezone(tz);
    format!("{} ({})", local.format("%a %Y-%m-%d %H:%M"), local.format("%Z"))
}
