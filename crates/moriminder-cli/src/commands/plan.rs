use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use chrono_tz::Tz;
use mockable::Clock;
use moriminder_core::models::{ReminderConfig, Task, TaskKind};
use moriminder_core::notifications::InMemoryNotificationCenter;
use moriminder_core::scheduler::ReminderScheduler;
use moriminder_core::service::ReminderService;
use owo_colors::OwoColorize;
use std::sync::Arc;
use uuid::Uuid;

use crate::cli::PlanCommand;
use crate::parser::{parse_date, parse_optional_date};
use crate::views::table::{display_notifications, ViewNotification};

/// Clock pinned to the reference time of a preview.
struct PreviewClock(DateTime<Utc>);

impl Clock for PreviewClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}

pub async fn plan_reminders(command: PlanCommand, config: &ReminderConfig, tz: &Tz) -> Result<()> {
    let now = match command.now.as_deref() {
        Some(input) => parse_date(input, Utc::now(), tz)?,
        None => Utc::now(),
    };

    let task = build_task(&command, now, tz)?;
    task.validate()?;

    let center = Arc::new(InMemoryNotificationCenter::with_foreign_pending(command.pending));
    let service = ReminderService::new(Arc::clone(&center), Arc::new(PreviewClock(now)), config);

    let intervals = service.scheduler().intervals(&task, now);
    let window = ReminderScheduler::window(&task, now);

    service.schedule_alarm(&task).await?;
    let report = service.schedule(&task).await?;

    let describe = |value: Option<String>| value.unwrap_or_else(|| "unknown".to_string());
    println!("Plan for '{}'", task.title.bold());
    println!(
        "  priority: {}  kind: {}",
        describe(task.priority.map(|p| p.to_string())),
        describe(task.kind.map(|k| k.to_string()))
    );
    println!(
        "  intervals: {} min",
        intervals
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!(
        "  mode: {}  cap: {}  granted: {}  planned: {}  pending before: {}/{}",
        format!("{:?}", window.anchor_mode).to_lowercase(),
        ReminderScheduler::max_notifications(&task),
        report.granted,
        report.planned.len(),
        command.pending,
        config.notification_ceiling
    );

    let notifications: Vec<ViewNotification> = center
        .pending_for(task.id)
        .into_iter()
        .map(|request| ViewNotification {
            fire_time: request.fire_time,
            kind: request.kind,
        })
        .collect();
    display_notifications(&notifications, now, tz);

    if report.failed > 0 {
        println!("{} {} notifications failed to schedule", "Warning:".yellow().bold(), report.failed);
    }
    Ok(())
}

fn build_task(command: &PlanCommand, now: DateTime<Utc>, tz: &Tz) -> Result<Task> {
    let date = |input: &Option<String>| parse_optional_date(input.as_deref(), now, tz);

    let deadline = date(&command.deadline)?;
    let start_time = date(&command.start)?;
    let alarm_time = date(&command.alarm)?;

    let mut task = Task {
        title: command.title.clone(),
        deadline,
        start_time,
        alarm_enabled: alarm_time.is_some(),
        alarm_time,
        reminder_enabled: true,
        reminder_start_time: date(&command.reminder_start)?,
        reminder_end_time: date(&command.reminder_end)?,
        parent_task_id: command.instance.then(Uuid::now_v7),
        created_at: now,
        ..Default::default()
    };

    if let Some(priority) = command.priority {
        task.priority = Some(priority);
    }

    // an event is implied by a start time without a deadline
    task.kind = match command.kind {
        Some(kind) => Some(kind),
        None if deadline.is_none() && start_time.is_some() => Some(TaskKind::ScheduledEvent),
        None => task.kind,
    };

    if command.no_metadata {
        task.priority = None;
        task.kind = None;
    }

    if let Some(interval) = command.interval {
        task.reminder_interval_minutes = interval;
    }

    Ok(task)
}
