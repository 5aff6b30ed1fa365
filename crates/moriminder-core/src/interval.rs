//! Reminder interval derivation.
//!
//! Deadline tasks remind at the cadence the user picked. Scheduled events get a
//! staged cadence that tightens as the start time approaches: every stage whose
//! threshold is still ahead contributes its interval, and an overdue interval is
//! appended once the event has started.

use chrono::{DateTime, Duration, Utc};

use crate::models::{Task, TaskKind, TaskPriority};

/// Interval used when a scheduled event has no start time or no stage applies.
pub const DEFAULT_FALLBACK_MINUTES: u32 = 60;

const MINUTES_PER_HOUR: i64 = 60;
const MINUTES_PER_DAY: i64 = 24 * MINUTES_PER_HOUR;

/// One row of a staged table: applies while more than `threshold_minutes` remain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stage {
    pub threshold_minutes: i64,
    pub interval_minutes: u32,
}

impl Stage {
    const fn days(days: i64, interval_minutes: u32) -> Self {
        Self {
            threshold_minutes: days * MINUTES_PER_DAY,
            interval_minutes,
        }
    }

    const fn hours(hours: i64, interval_minutes: u32) -> Self {
        Self {
            threshold_minutes: hours * MINUTES_PER_HOUR,
            interval_minutes,
        }
    }

    const fn minutes(minutes: i64, interval_minutes: u32) -> Self {
        Self {
            threshold_minutes: minutes,
            interval_minutes,
        }
    }

    pub fn threshold(&self) -> Duration {
        Duration::minutes(self.threshold_minutes)
    }
}

/// Stages in descending threshold order plus the interval used once overdue.
#[derive(Debug, Clone, Copy)]
pub struct StageTable {
    pub stages: &'static [Stage],
    pub overdue_interval_minutes: u32,
}

const LOW_STAGES: StageTable = StageTable {
    stages: &[
        Stage::days(3, 1440),
        Stage::days(1, 720),
        Stage::hours(6, 360),
        Stage::hours(1, 60),
    ],
    overdue_interval_minutes: 30,
};

const MEDIUM_STAGES: StageTable = StageTable {
    stages: &[
        Stage::days(7, 1440),
        Stage::days(3, 720),
        Stage::days(1, 360),
        Stage::hours(6, 180),
        Stage::hours(3, 60),
        Stage::hours(1, 30),
    ],
    overdue_interval_minutes: 15,
};

const HIGH_STAGES: StageTable = StageTable {
    stages: &[
        Stage::days(7, 1440),
        Stage::days(3, 720),
        Stage::days(1, 360),
        Stage::hours(6, 180),
        Stage::hours(3, 60),
        Stage::hours(1, 30),
        Stage::minutes(30, 15),
        Stage::minutes(15, 5),
        Stage::minutes(5, 1),
    ],
    overdue_interval_minutes: 1,
};

/// Maps a task's priority and kind to the cyclic list of reminder intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalPolicy {
    fallback_minutes: u32,
}

impl Default for IntervalPolicy {
    fn default() -> Self {
        Self {
            fallback_minutes: DEFAULT_FALLBACK_MINUTES,
        }
    }
}

impl IntervalPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `minutes` instead of the hourly fallback (clamped to at least 1).
    pub fn with_fallback(minutes: u32) -> Self {
        Self {
            fallback_minutes: minutes.max(1),
        }
    }

    /// The staged table for a priority.
    pub fn stage_table(priority: TaskPriority) -> &'static StageTable {
        match priority {
            TaskPriority::Low => &LOW_STAGES,
            TaskPriority::Medium => &MEDIUM_STAGES,
            TaskPriority::High => &HIGH_STAGES,
        }
    }

    /// Returns a non-empty list of positive interval minutes, used cyclically.
    pub fn intervals(&self, task: &Task, now: DateTime<Utc>) -> Vec<u32> {
        let configured = vec![task.reminder_interval_minutes.max(1)];

        let (Some(priority), Some(kind)) = (task.priority, task.kind) else {
            return configured;
        };

        match kind {
            TaskKind::DeadlineTask => configured,
            TaskKind::ScheduledEvent => match task.start_time {
                Some(start) => self.staged_intervals(priority, start, now),
                None => vec![self.fallback_minutes],
            },
        }
    }

    /// Staged intervals for an event starting at `start`, evaluated at `now`.
    pub fn staged_intervals(
        &self,
        priority: TaskPriority,
        start: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Vec<u32> {
        let table = Self::stage_table(priority);
        let time_until_start = start - now;

        let mut intervals: Vec<u32> = table
            .stages
            .iter()
            .filter(|stage| time_until_start > stage.threshold())
            .map(|stage| stage.interval_minutes)
            .collect();

        if time_until_start <= Duration::zero() {
            intervals.push(table.overdue_interval_minutes);
        }

        if intervals.is_empty() {
            vec![self.fallback_minutes]
        } else {
            intervals
        }
    }
}
