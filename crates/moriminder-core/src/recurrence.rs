use chrono::{DateTime, Datelike, Days, Duration, Months, NaiveDate, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::{ReminderConfig, Task};
use crate::timezone::{parse_timezone, resolve_local, to_local};

/// Months scanned for an nth-weekday occurrence before giving up.
const NTH_WEEKDAY_SEARCH_MONTHS: u32 = 12;

/// How a repeating task produces its next occurrence.
///
/// Weekdays are numbered 1 (Sunday) through 7 (Saturday).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecurrencePattern {
    Daily,
    Weekly,
    Monthly,
    Yearly,
    EveryNDays { days: u32 },
    EveryNHours { hours: u32 },
    NthWeekdayOfMonth { weekday: u8, week: u8 },
    Custom { weekdays: BTreeSet<u8> },
}

impl RecurrencePattern {
    pub fn custom(weekdays: impl IntoIterator<Item = u8>) -> Self {
        RecurrencePattern::Custom {
            weekdays: weekdays.into_iter().collect(),
        }
    }

    /// Rejects parameters no calendar can satisfy.
    pub fn validate(&self) -> Result<(), CoreError> {
        match self {
            RecurrencePattern::EveryNDays { days: 0 } => Err(CoreError::InvalidPattern(
                "day interval must be at least 1".to_string(),
            )),
            RecurrencePattern::EveryNHours { hours: 0 } => Err(CoreError::InvalidPattern(
                "hour interval must be at least 1".to_string(),
            )),
            RecurrencePattern::NthWeekdayOfMonth { weekday, week } => {
                weekday_from_number(*weekday)?;
                if !(1..=5).contains(week) {
                    return Err(CoreError::InvalidPattern(format!(
                        "week of month must be between 1 and 5, got {}",
                        week
                    )));
                }
                Ok(())
            }
            RecurrencePattern::Custom { weekdays } => {
                if weekdays.is_empty() {
                    return Err(CoreError::InvalidPattern(
                        "custom pattern needs at least one weekday".to_string(),
                    ));
                }
                weekdays
                    .iter()
                    .try_for_each(|&day| weekday_from_number(day).map(|_| ()))
            }
            _ => Ok(()),
        }
    }

    /// Reads the flat JSON shape stored by earlier app versions:
    /// `{"type": "everyNDays", "interval": 3, "weekday": null, "week": null, "customDays": null}`.
    pub fn from_legacy_json(json: &str) -> Result<Self, CoreError> {
        let legacy: LegacyPattern = serde_json::from_str(json)
            .map_err(|e| CoreError::InvalidPattern(format!("malformed pattern JSON: {}", e)))?;

        let missing = |field: &str| {
            CoreError::InvalidPattern(format!("'{}' pattern is missing '{}'", legacy.kind, field))
        };

        let pattern = match legacy.kind.as_str() {
            "daily" => RecurrencePattern::Daily,
            "weekly" => RecurrencePattern::Weekly,
            "monthly" => RecurrencePattern::Monthly,
            "yearly" => RecurrencePattern::Yearly,
            "everyNDays" => RecurrencePattern::EveryNDays {
                days: legacy.interval.ok_or_else(|| missing("interval"))?,
            },
            "everyNHours" => RecurrencePattern::EveryNHours {
                hours: legacy.interval.ok_or_else(|| missing("interval"))?,
            },
            "nthWeekdayOfMonth" => RecurrencePattern::NthWeekdayOfMonth {
                weekday: legacy.weekday.ok_or_else(|| missing("weekday"))?,
                week: legacy.week.ok_or_else(|| missing("week"))?,
            },
            "custom" => RecurrencePattern::custom(
                legacy.custom_days.ok_or_else(|| missing("customDays"))?,
            ),
            other => {
                return Err(CoreError::InvalidPattern(format!(
                    "unknown pattern type '{}'",
                    other
                )))
            }
        };

        pattern.validate()?;
        Ok(pattern)
    }

    /// Writes the flat JSON shape understood by earlier app versions.
    pub fn to_legacy_json(&self) -> Result<String, CoreError> {
        let named = |kind: &str| LegacyPattern {
            kind: kind.to_string(),
            ..Default::default()
        };

        let legacy = match self {
            RecurrencePattern::Daily => named("daily"),
            RecurrencePattern::Weekly => named("weekly"),
            RecurrencePattern::Monthly => named("monthly"),
            RecurrencePattern::Yearly => named("yearly"),
            RecurrencePattern::EveryNDays { days } => LegacyPattern {
                interval: Some(*days),
                ..named("everyNDays")
            },
            RecurrencePattern::EveryNHours { hours } => LegacyPattern {
                interval: Some(*hours),
                ..named("everyNHours")
            },
            RecurrencePattern::NthWeekdayOfMonth { weekday, week } => LegacyPattern {
                weekday: Some(*weekday),
                week: Some(*week),
                ..named("nthWeekdayOfMonth")
            },
            RecurrencePattern::Custom { weekdays } => LegacyPattern {
                custom_days: Some(weekdays.iter().copied().collect()),
                ..named("custom")
            },
        };

        serde_json::to_string(&legacy)
            .map_err(|e| CoreError::InvalidPattern(format!("failed to encode pattern: {}", e)))
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct LegacyPattern {
    #[serde(rename = "type")]
    kind: String,
    interval: Option<u32>,
    weekday: Option<u8>,
    week: Option<u8>,
    #[serde(rename = "customDays")]
    custom_days: Option<Vec<u8>>,
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid recurrence pattern '{input}': {reason}")]
pub struct ParsePatternError {
    input: String,
    reason: String,
}

impl ParsePatternError {
    fn new(input: &str, reason: impl Into<String>) -> Self {
        Self {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

/// Text form: `daily`, `weekly`, `monthly`, `yearly`, `every:3d`, `every:6h`,
/// `nth:<weekday>:<week>`, `custom:mon,wed,fri` (names or numbers 1-7).
impl FromStr for RecurrencePattern {
    type Err = ParsePatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim().to_lowercase();
        let (head, rest) = match input.split_once(':') {
            Some((head, rest)) => (head, Some(rest)),
            None => (input.as_str(), None),
        };

        let pattern = match (head, rest) {
            ("daily", None) => RecurrencePattern::Daily,
            ("weekly", None) => RecurrencePattern::Weekly,
            ("monthly", None) => RecurrencePattern::Monthly,
            ("yearly", None) => RecurrencePattern::Yearly,
            ("every", Some(rest)) => {
                let parse_count = |digits: &str| {
                    digits
                        .parse::<u32>()
                        .map_err(|_| ParsePatternError::new(s, "expected a number before the unit"))
                };
                if let Some(days) = rest.strip_suffix('d') {
                    RecurrencePattern::EveryNDays {
                        days: parse_count(days)?,
                    }
                } else if let Some(hours) = rest.strip_suffix('h') {
                    RecurrencePattern::EveryNHours {
                        hours: parse_count(hours)?,
                    }
                } else {
                    return Err(ParsePatternError::new(s, "unit must be 'd' or 'h'"));
                }
            }
            ("nth", Some(rest)) => {
                let (weekday, week) = rest
                    .split_once(':')
                    .ok_or_else(|| ParsePatternError::new(s, "expected nth:<weekday>:<week>"))?;
                RecurrencePattern::NthWeekdayOfMonth {
                    weekday: parse_weekday_token(weekday)
                        .ok_or_else(|| ParsePatternError::new(s, "unknown weekday"))?,
                    week: week
                        .parse()
                        .map_err(|_| ParsePatternError::new(s, "week must be a number"))?,
                }
            }
            ("custom", Some(rest)) => {
                let weekdays = rest
                    .split(',')
                    .map(|token| {
                        parse_weekday_token(token)
                            .ok_or_else(|| ParsePatternError::new(s, "unknown weekday"))
                    })
                    .collect::<Result<BTreeSet<u8>, _>>()?;
                RecurrencePattern::Custom { weekdays }
            }
            _ => return Err(ParsePatternError::new(s, "unrecognized pattern")),
        };

        pattern
            .validate()
            .map_err(|e| ParsePatternError::new(s, e.to_string()))?;
        Ok(pattern)
    }
}

impl std::fmt::Display for RecurrencePattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecurrencePattern::Daily => write!(f, "daily"),
            RecurrencePattern::Weekly => write!(f, "weekly"),
            RecurrencePattern::Monthly => write!(f, "monthly"),
            RecurrencePattern::Yearly => write!(f, "yearly"),
            RecurrencePattern::EveryNDays { days } => write!(f, "every:{}d", days),
            RecurrencePattern::EveryNHours { hours } => write!(f, "every:{}h", hours),
            RecurrencePattern::NthWeekdayOfMonth { weekday, week } => {
                write!(f, "nth:{}:{}", weekday_name(*weekday), week)
            }
            RecurrencePattern::Custom { weekdays } => {
                let names: Vec<&str> = weekdays.iter().map(|&d| weekday_name(d)).collect();
                write!(f, "custom:{}", names.join(","))
            }
        }
    }
}

const WEEKDAY_NAMES: [&str; 7] = ["sun", "mon", "tue", "wed", "thu", "fri", "sat"];
const WEEKDAY_FULL_NAMES: [&str; 7] = [
    "sunday",
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
];

fn weekday_name(number: u8) -> &'static str {
    WEEKDAY_NAMES
        .get(usize::from(number).wrapping_sub(1))
        .copied()
        .unwrap_or("?")
}

fn parse_weekday_token(token: &str) -> Option<u8> {
    let token = token.trim();
    if let Ok(number) = token.parse::<u8>() {
        return Some(number);
    }
    WEEKDAY_NAMES
        .iter()
        .zip(WEEKDAY_FULL_NAMES)
        .position(|(short, full)| token == *short || token == full)
        .map(|index| index as u8 + 1)
}

fn weekday_from_number(number: u8) -> Result<Weekday, CoreError> {
    match number {
        1 => Ok(Weekday::Sun),
        2 => Ok(Weekday::Mon),
        3 => Ok(Weekday::Tue),
        4 => Ok(Weekday::Wed),
        5 => Ok(Weekday::Thu),
        6 => Ok(Weekday::Fri),
        7 => Ok(Weekday::Sat),
        _ => Err(CoreError::InvalidPattern(format!(
            "weekday must be between 1 (Sunday) and 7 (Saturday), got {}",
            number
        ))),
    }
}

fn weekday_number(date: NaiveDate) -> u8 {
    date.weekday().number_from_sunday() as u8
}

/// RecurrenceResolver: computes the next occurrence of a pattern.
///
/// Calendar arithmetic runs on the wall clock of a single IANA timezone so
/// that "daily at 09:00" stays at 09:00 across DST changes. Hour-based
/// patterns add absolute durations instead.
#[derive(Debug, Clone)]
pub struct RecurrenceResolver {
    timezone: Tz,
}

impl Default for RecurrenceResolver {
    fn default() -> Self {
        Self { timezone: Tz::UTC }
    }
}

impl RecurrenceResolver {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    /// Creates a resolver for the timezone named in the configuration.
    pub fn from_config(config: &ReminderConfig) -> Result<Self, CoreError> {
        Ok(Self::new(parse_timezone(&config.timezone)?))
    }

    pub fn timezone(&self) -> &Tz {
        &self.timezone
    }

    /// Finds the next occurrence after `reference`.
    ///
    /// # Returns
    /// * `Ok(Some(dt))` - the next occurrence
    /// * `Ok(None)` - the occurrence would fall after `end_date`; the series is over
    /// * `Err(CoreError::InvalidPattern)` - the pattern cannot produce dates
    pub fn next(
        &self,
        pattern: &RecurrencePattern,
        reference: DateTime<Utc>,
        end_date: Option<DateTime<Utc>>,
    ) -> Result<Option<DateTime<Utc>>, CoreError> {
        let candidate = self.next_unbounded(pattern, reference)?;

        match end_date {
            Some(end) if candidate > end => {
                debug!(%pattern, %candidate, %end, "next occurrence falls after recurrence end");
                Ok(None)
            }
            _ => Ok(Some(candidate)),
        }
    }

    /// Next occurrence ignoring any end date.
    pub fn next_unbounded(
        &self,
        pattern: &RecurrencePattern,
        reference: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, CoreError> {
        pattern.validate()?;

        let local = to_local(reference, &self.timezone);
        let date = local.date();

        let next_date = match pattern {
            RecurrencePattern::EveryNHours { hours } => {
                return reference
                    .checked_add_signed(Duration::hours(i64::from(*hours)))
                    .ok_or_else(out_of_range)
            }
            RecurrencePattern::Daily => add_days(date, 1)?,
            RecurrencePattern::Weekly => add_days(date, 7)?,
            RecurrencePattern::EveryNDays { days } => add_days(date, u64::from(*days))?,
            RecurrencePattern::Monthly => add_months(date, 1)?,
            RecurrencePattern::Yearly => add_months(date, 12)?,
            RecurrencePattern::NthWeekdayOfMonth { weekday, week } => {
                nth_weekday_after_month_of(date, weekday_from_number(*weekday)?, *week)?
            }
            RecurrencePattern::Custom { weekdays } => next_matching_weekday(date, weekdays)?,
        };

        Ok(resolve_local(next_date.and_time(local.time()), &self.timezone))
    }

    /// Preview up to `count` successive occurrences after `from`.
    pub fn preview(
        &self,
        pattern: &RecurrencePattern,
        from: DateTime<Utc>,
        count: usize,
        end_date: Option<DateTime<Utc>>,
    ) -> Result<Vec<DateTime<Utc>>, CoreError> {
        let mut occurrences = Vec::with_capacity(count);
        let mut reference = from;

        while occurrences.len() < count {
            match self.next(pattern, reference, end_date)? {
                Some(next) => {
                    occurrences.push(next);
                    reference = next;
                }
                None => break,
            }
        }

        Ok(occurrences)
    }
}

fn out_of_range() -> CoreError {
    CoreError::InvalidPattern("next occurrence is out of the supported date range".to_string())
}

fn add_days(date: NaiveDate, days: u64) -> Result<NaiveDate, CoreError> {
    date.checked_add_days(Days::new(days)).ok_or_else(out_of_range)
}

/// Adds calendar months, clamping the day to the target month's length.
fn add_months(date: NaiveDate, months: u32) -> Result<NaiveDate, CoreError> {
    date.checked_add_months(Months::new(months))
        .ok_or_else(out_of_range)
}

/// The `week`-th `weekday` of the month after `date`'s month, skipping months
/// that have no such day.
fn nth_weekday_after_month_of(
    date: NaiveDate,
    weekday: Weekday,
    week: u8,
) -> Result<NaiveDate, CoreError> {
    let first_of_month = date.with_day(1).ok_or_else(out_of_range)?;

    for offset in 1..=NTH_WEEKDAY_SEARCH_MONTHS {
        let month = add_months(first_of_month, offset)?;
        if let Some(found) =
            NaiveDate::from_weekday_of_month_opt(month.year(), month.month(), weekday, week)
        {
            return Ok(found);
        }
    }

    Err(CoreError::InvalidPattern(format!(
        "no occurrence #{} of {:?} within {} months",
        week, weekday, NTH_WEEKDAY_SEARCH_MONTHS
    )))
}

fn next_matching_weekday(date: NaiveDate, weekdays: &BTreeSet<u8>) -> Result<NaiveDate, CoreError> {
    for step in 1..=7 {
        let candidate = add_days(date, step)?;
        if weekdays.contains(&weekday_number(candidate)) {
            return Ok(candidate);
        }
    }

    Err(CoreError::InvalidPattern(
        "custom pattern matches no weekday".to_string(),
    ))
}

// ============================================================================
// RecurringTaskGenerator
// ============================================================================

/// RecurringTaskGenerator: materializes the next occurrence of a repeating task.
///
/// Occurrences are anchored at the source task's own target date, never at the
/// time of completion, so late completions do not drift the series.
#[derive(Debug, Clone, Default)]
pub struct RecurringTaskGenerator {
    resolver: RecurrenceResolver,
}

impl RecurringTaskGenerator {
    pub fn new(resolver: RecurrenceResolver) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &RecurrenceResolver {
        &self.resolver
    }

    /// First occurrence for a freshly created repeating task.
    ///
    /// Generated occurrences never spawn further occurrences on creation.
    pub fn on_created(&self, task: &Task, now: DateTime<Utc>) -> Result<Option<Task>, CoreError> {
        if !task.is_repeating || task.is_instance() {
            return Ok(None);
        }
        self.next_occurrence(task, now)
    }

    /// Next occurrence after `task` has been completed.
    pub fn on_completed(&self, task: &Task, now: DateTime<Utc>) -> Result<Option<Task>, CoreError> {
        if !task.is_repeating {
            return Ok(None);
        }
        self.next_occurrence(task, now)
    }

    fn next_occurrence(&self, task: &Task, now: DateTime<Utc>) -> Result<Option<Task>, CoreError> {
        let Some(pattern) = &task.recurrence else {
            debug!(task_id = %task.id, "repeating task has no recurrence pattern");
            return Ok(None);
        };

        let anchor = task.target_time().unwrap_or(task.created_at);

        match self.resolver.next(pattern, anchor, task.recurrence_end_date)? {
            Some(occurrence) => Self::materialize(task, anchor, occurrence, now).map(Some),
            None => {
                debug!(task_id = %task.id, "no further occurrence");
                Ok(None)
            }
        }
    }

    /// Copies `source` into a new pending occurrence with every date shifted
    /// by `occurrence - anchor`.
    pub fn materialize(
        source: &Task,
        anchor: DateTime<Utc>,
        occurrence: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Task, CoreError> {
        let shift = occurrence - anchor;
        let moved = |at: Option<DateTime<Utc>>| {
            at.map(|dt| dt.checked_add_signed(shift).ok_or_else(out_of_range))
                .transpose()
        };

        Ok(Task {
            id: Uuid::now_v7(),
            title: source.title.clone(),
            priority: source.priority,
            kind: source.kind,
            deadline: moved(source.deadline)?,
            start_time: moved(source.start_time)?,
            alarm_enabled: source.alarm_enabled,
            alarm_time: moved(source.alarm_time)?,
            reminder_enabled: source.reminder_enabled,
            reminder_interval_minutes: source.reminder_interval_minutes,
            reminder_start_time: moved(source.reminder_start_time)?,
            reminder_end_time: moved(source.reminder_end_time)?,
            is_completed: false,
            completed_at: None,
            is_repeating: true,
            recurrence: source.recurrence.clone(),
            recurrence_end_date: source.recurrence_end_date,
            parent_task_id: Some(source.parent_task_id.unwrap_or(source.id)),
            created_at: now,
        })
    }
}
