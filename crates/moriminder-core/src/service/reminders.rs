use chrono::{DateTime, Utc};
use mockable::Clock;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::budget::NotificationBudget;
use crate::error::CoreError;
use crate::interval::IntervalPolicy;
use crate::models::{NotificationId, NotificationRequest, ReminderConfig, ScheduleReport, Task};
use crate::notifications::NotificationCenter;
use crate::scheduler::ReminderScheduler;

/// Plans reminders for a task and dispatches them within the notification budget.
pub struct ReminderService<N, C>
where
    N: NotificationCenter,
    C: Clock + Send + Sync,
{
    center: Arc<N>,
    budget: NotificationBudget<N>,
    scheduler: ReminderScheduler,
    clock: Arc<C>,
}

impl<N, C> ReminderService<N, C>
where
    N: NotificationCenter,
    C: Clock + Send + Sync,
{
    pub fn new(center: Arc<N>, clock: Arc<C>, config: &ReminderConfig) -> Self {
        Self {
            budget: NotificationBudget::new(Arc::clone(&center), config.notification_ceiling),
            center,
            scheduler: ReminderScheduler::new(IntervalPolicy::with_fallback(
                config.default_interval_minutes,
            )),
            clock,
        }
    }

    pub fn budget(&self) -> &NotificationBudget<N> {
        &self.budget
    }

    pub fn scheduler(&self) -> &ReminderScheduler {
        &self.scheduler
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.utc()
    }

    /// Schedules the reminder batch for `task`.
    pub async fn schedule(&self, task: &Task) -> Result<ScheduleReport, CoreError> {
        self.schedule_with_cancel(task, &CancellationToken::new()).await
    }

    /// Schedules the reminder batch for `task`, stopping early once `cancel` fires.
    ///
    /// Slots are reserved before any planning happens, so a full budget fails
    /// with `BudgetExhausted` without touching the notification center.
    /// Individual dispatch failures are counted in the report, not returned.
    pub async fn schedule_with_cancel(
        &self,
        task: &Task,
        cancel: &CancellationToken,
    ) -> Result<ScheduleReport, CoreError> {
        if task.is_completed || !task.reminder_enabled {
            debug!(task_id = %task.id, "reminders not applicable");
            return Ok(ScheduleReport::default());
        }

        let granted = self
            .budget
            .reserve(ReminderScheduler::max_notifications(task))
            .await?;

        let now = self.now();
        let intervals = self.scheduler.intervals(task, now);
        let planned = self.scheduler.plan(task, &intervals, granted, now);

        let mut report = ScheduleReport {
            granted,
            planned: planned.clone(),
            ..Default::default()
        };

        for fire_time in planned {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            let request = NotificationRequest::reminder(task.id, fire_time);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    report.cancelled = true;
                    break;
                }
                result = self.center.schedule(request) => match result {
                    Ok(id) => report.dispatched.push(id),
                    Err(e) => {
                        warn!(task_id = %task.id, %fire_time, error = %e, "failed to dispatch reminder");
                        report.failed += 1;
                    }
                },
            }
        }

        // dispatched notifications now show up in the live pending count
        self.budget.release(granted).await;

        info!(
            task_id = %task.id,
            granted,
            planned = report.planned.len(),
            dispatched = report.dispatched.len(),
            failed = report.failed,
            cancelled = report.cancelled,
            "scheduled reminders"
        );
        Ok(report)
    }

    /// Schedules the single next reminder of an open-ended task after a delivery at `from`.
    ///
    /// # Returns
    /// * `Ok(Some(id))` - a reminder was dispatched
    /// * `Ok(None)` - nothing to schedule (bounded, completed, disabled, or in the past)
    pub async fn schedule_next(
        &self,
        task: &Task,
        from: DateTime<Utc>,
    ) -> Result<Option<NotificationId>, CoreError> {
        let now = self.now();
        let intervals = self.scheduler.intervals(task, now);
        let Some(fire_time) = ReminderScheduler::next_fire_time(task, &intervals, from, now) else {
            return Ok(None);
        };

        self.dispatch_single(NotificationRequest::reminder(task.id, fire_time))
            .await
            .map(Some)
    }

    /// Schedules the one-shot alarm at `alarm_time` when it lies in the future.
    pub async fn schedule_alarm(&self, task: &Task) -> Result<Option<NotificationId>, CoreError> {
        let Some(alarm_time) = task.alarm_time.filter(|_| task.alarm_enabled && !task.is_completed)
        else {
            return Ok(None);
        };

        if alarm_time <= self.now() {
            debug!(task_id = %task.id, %alarm_time, "alarm time already passed");
            return Ok(None);
        }

        self.dispatch_single(NotificationRequest::alarm(task.id, alarm_time))
            .await
            .map(Some)
    }

    pub async fn cancel_all(&self, task_id: Uuid) -> Result<usize, CoreError> {
        let cancelled = self.center.cancel_all(task_id).await?;
        debug!(%task_id, cancelled, "cancelled pending notifications");
        Ok(cancelled)
    }

    async fn dispatch_single(
        &self,
        request: NotificationRequest,
    ) -> Result<NotificationId, CoreError> {
        let granted = self.budget.reserve(1).await?;
        let result = self.center.schedule(request).await;
        self.budget.release(granted).await;

        match &result {
            Ok(_) => info!(task_id = %request.task_id, kind = %request.kind, fire_time = %request.fire_time, "scheduled notification"),
            Err(e) => warn!(task_id = %request.task_id, kind = %request.kind, error = %e, "failed to schedule notification"),
        }
        result
    }
}
