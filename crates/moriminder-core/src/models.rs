use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::error::CoreError;
use crate::recurrence::RecurrencePattern;

/// Identifier handed back by the notification subsystem for a scheduled request.
pub type NotificationId = Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid task priority: {0}")]
pub struct ParseTaskPriorityError(String);

impl FromStr for TaskPriority {
    type Err = ParseTaskPriorityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(TaskPriority::Low),
            "medium" => Ok(TaskPriority::Medium),
            "high" => Ok(TaskPriority::High),
            _ => Err(ParseTaskPriorityError(s.to_string())),
        }
    }
}

impl std::fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskPriority::Low => write!(f, "low"),
            TaskPriority::Medium => write!(f, "medium"),
            TaskPriority::High => write!(f, "high"),
        }
    }
}

/// What a task's dates mean: a deadline to meet, or an event that starts at a time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    DeadlineTask,
    ScheduledEvent,
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid task kind: {0}")]
pub struct ParseTaskKindError(String);

impl FromStr for TaskKind {
    type Err = ParseTaskKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "task" | "deadline" | "deadline_task" => Ok(TaskKind::DeadlineTask),
            "schedule" | "event" | "scheduled_event" => Ok(TaskKind::ScheduledEvent),
            _ => Err(ParseTaskKindError(s.to_string())),
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskKind::DeadlineTask => write!(f, "deadline_task"),
            TaskKind::ScheduledEvent => write!(f, "scheduled_event"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Alarm,
    Reminder,
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationKind::Alarm => write!(f, "alarm"),
            NotificationKind::Reminder => write!(f, "reminder"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    /// `None` for legacy records created before priorities existed
    pub priority: Option<TaskPriority>,
    /// `None` for legacy records created before task kinds existed
    pub kind: Option<TaskKind>,
    pub deadline: Option<DateTime<Utc>>,
    pub start_time: Option<DateTime<Utc>>,
    pub alarm_enabled: bool,
    pub alarm_time: Option<DateTime<Utc>>,
    pub reminder_enabled: bool,
    /// User-chosen reminder cadence, used as-is for deadline tasks
    pub reminder_interval_minutes: u32,
    pub reminder_start_time: Option<DateTime<Utc>>,
    pub reminder_end_time: Option<DateTime<Utc>>,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub is_repeating: bool,
    pub recurrence: Option<RecurrencePattern>,
    pub recurrence_end_date: Option<DateTime<Utc>>,
    /// Set on generated occurrences; points at the root task of the series
    pub parent_task_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Default for Task {
    fn default() -> Self {
        Self {
            id: Uuid::now_v7(),
            title: String::new(),
            priority: Some(TaskPriority::Medium),
            kind: Some(TaskKind::DeadlineTask),
            deadline: None,
            start_time: None,
            alarm_enabled: false,
            alarm_time: None,
            reminder_enabled: false,
            reminder_interval_minutes: 60,
            reminder_start_time: None,
            reminder_end_time: None,
            is_completed: false,
            completed_at: None,
            is_repeating: false,
            recurrence: None,
            recurrence_end_date: None,
            parent_task_id: None,
            created_at: Utc::now(),
        }
    }
}

impl Task {
    /// The moment reminders count down to: the deadline, else the start time.
    pub fn target_time(&self) -> Option<DateTime<Utc>> {
        self.deadline.or(self.start_time)
    }

    /// Upper bound for reminders: explicit reminder end, else the target time.
    pub fn reminder_bound(&self) -> Option<DateTime<Utc>> {
        self.reminder_end_time.or_else(|| self.target_time())
    }

    /// Whether this task was materialized from a repeating parent.
    pub fn is_instance(&self) -> bool {
        self.parent_task_id.is_some()
    }

    /// Checks the invariants that must hold before a task may be saved.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.title.trim().is_empty() {
            return Err(CoreError::InvalidTask("title must not be empty".to_string()));
        }

        if let (Some(deadline), Some(start)) = (self.deadline, self.start_time) {
            if deadline < start {
                return Err(CoreError::InvalidTask(format!(
                    "deadline {} is before start time {}",
                    deadline, start
                )));
            }
        }

        if self.reminder_enabled && self.reminder_interval_minutes == 0 {
            return Err(CoreError::InvalidTask(
                "reminder interval must be at least one minute".to_string(),
            ));
        }

        if self.is_repeating {
            if let Some(pattern) = &self.recurrence {
                pattern
                    .validate()
                    .map_err(|e| CoreError::InvalidTask(e.to_string()))?;
            }
        }

        Ok(())
    }
}

/// A single notification the dispatcher should deliver. Never persisted by the core.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationRequest {
    pub task_id: Uuid,
    pub fire_time: DateTime<Utc>,
    pub kind: NotificationKind,
}

impl NotificationRequest {
    pub fn reminder(task_id: Uuid, fire_time: DateTime<Utc>) -> Self {
        Self {
            task_id,
            fire_time,
            kind: NotificationKind::Reminder,
        }
    }

    pub fn alarm(task_id: Uuid, fire_time: DateTime<Utc>) -> Self {
        Self {
            task_id,
            fire_time,
            kind: NotificationKind::Alarm,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorMode {
    /// Accumulate intervals forward from `start_bound`
    Forward,
    /// Count intervals back from `target`
    Backward,
}

/// Time window reminders are placed in, derived from a task at scheduling time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderWindow {
    pub anchor_mode: AnchorMode,
    pub start_bound: DateTime<Utc>,
    pub end_bound: Option<DateTime<Utc>>,
    pub target: Option<DateTime<Utc>>,
}

/// Configuration for the reminder engine - core version
/// The CLI layers figment-loaded values on top of these defaults
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReminderConfig {
    /// Platform ceiling on simultaneously pending notifications
    pub notification_ceiling: usize,
    /// Cadence for scheduled events with no start time or no applicable stage
    pub default_interval_minutes: u32,
    /// IANA timezone whose calendar drives recurrence arithmetic
    pub timezone: String,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            notification_ceiling: 64,
            default_interval_minutes: 60,
            timezone: "UTC".to_string(),
        }
    }
}

/// Outcome of one reminder scheduling attempt.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScheduleReport {
    /// Slots granted by the budget for this attempt
    pub granted: usize,
    /// Fire times produced by the planner, ascending
    pub planned: Vec<DateTime<Utc>>,
    pub dispatched: Vec<NotificationId>,
    pub failed: usize,
    /// True when the batch was stopped by its cancellation token
    pub cancelled: bool,
}

#[derive(Debug)]
pub struct CreationResult {
    pub task: Task,
    pub alarm: Option<Result<NotificationId, CoreError>>,
    pub reminders: Option<Result<ScheduleReport, CoreError>>,
    pub next_occurrence: Option<Task>,
}

#[derive(Debug)]
pub enum CompletionResult {
    Single(Task),
    Recurring { completed: Task, next: Task },
    /// The task repeats but its recurrence end date has been reached
    SeriesEnded { completed: Task },
}
