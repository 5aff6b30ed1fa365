use crate::error::CoreError;
use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::str::FromStr;

/// Validate IANA timezone name
pub fn validate_timezone(timezone: &str) -> Result<(), CoreError> {
    parse_timezone(timezone).map(|_| ())
}

/// Parse an IANA timezone name into a `Tz`
pub fn parse_timezone(timezone: &str) -> Result<Tz, CoreError> {
    Tz::from_str(timezone)
        .map_err(|_| CoreError::InvalidTimezone(format!("Invalid timezone: {}", timezone)))
}

/// Wall-clock date and time of `at` in `tz`
pub fn to_local(at: DateTime<Utc>, tz: &Tz) -> NaiveDateTime {
    at.with_timezone(tz).naive_local()
}

/// Map a local wall-clock time back to UTC, handling DST transitions.
///
/// Ambiguous times (fall back) resolve to the earliest instant. Times that do
/// not exist (spring forward) move one hour later.
pub fn resolve_local(local: NaiveDateTime, tz: &Tz) -> DateTime<Utc> {
    if let Some(local_dt) = tz.from_local_datetime(&local).earliest() {
        return local_dt.with_timezone(&Utc);
    }

    let shifted = local + Duration::hours(1);
    match tz.from_local_datetime(&shifted).earliest() {
        Some(local_dt) => local_dt.with_timezone(&Utc),
        None => Utc.from_utc_datetime(&local),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_validate_timezone() {
        assert!(validate_timezone("UTC").is_ok());
        assert!(validate_timezone("Asia/Tokyo").is_ok());
        assert!(matches!(
            validate_timezone("Invalid/Timezone"),
            Err(CoreError::InvalidTimezone(_))
        ));
    }

    #[test]
    fn test_local_round_trip_outside_dst_change() {
        let tz = parse_timezone("Asia/Tokyo").unwrap();
        let at = Utc.with_ymd_and_hms(2025, 11, 9, 0, 30, 0).unwrap();
        let local = to_local(at, &tz);
        assert_eq!(local.to_string(), "2025-11-09 09:30:00");
        assert_eq!(resolve_local(local, &tz), at);
    }

    #[test]
    fn test_spring_forward_gap_moves_one_hour_later() {
        let tz = parse_timezone("America/New_York").unwrap();
        // 02:30 does not exist on 2025-03-09 in New York
        let gap = NaiveDate::from_ymd_opt(2025, 3, 9)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();
        let resolved = resolve_local(gap, &tz);
        assert_eq!(to_local(resolved, &tz).to_string(), "2025-03-09 03:30:00");
    }

    #[test]
    fn test_fall_back_picks_earliest_instant() {
        let tz = parse_timezone("America/New_York").unwrap();
        let ambiguous = NaiveDate::from_ymd_opt(2025, 11, 2)
            .unwrap()
            .and_hms_opt(1, 30, 0)
            .unwrap();
        let resolved = resolve_local(ambiguous, &tz);
        // EDT (-4) is the earlier of the two readings
        assert_eq!(resolved, Utc.with_ymd_and_hms(2025, 11, 2, 5, 30, 0).unwrap());
    }
}
