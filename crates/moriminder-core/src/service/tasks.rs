use chrono::{DateTime, Utc};
use mockable::Clock;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::{CompletionResult, CreationResult, NotificationId, ScheduleReport, Task};
use crate::notifications::NotificationCenter;
use crate::recurrence::RecurringTaskGenerator;
use crate::repository::TaskRepository;
use crate::service::reminders::ReminderService;

/// Task lifecycle: validation, persistence, notifications and recurrence.
///
/// Only validation and persistence failures abort an operation. Notification
/// and recurrence problems after a successful save are logged and reported in
/// the returned result.
pub struct TaskService<R, N, C>
where
    R: TaskRepository,
    N: NotificationCenter,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    reminders: Arc<ReminderService<N, C>>,
    generator: RecurringTaskGenerator,
}

impl<R, N, C> TaskService<R, N, C>
where
    R: TaskRepository,
    N: NotificationCenter,
    C: Clock + Send + Sync,
{
    pub fn new(
        repository: Arc<R>,
        reminders: Arc<ReminderService<N, C>>,
        generator: RecurringTaskGenerator,
    ) -> Self {
        Self {
            repository,
            reminders,
            generator,
        }
    }

    pub fn reminders(&self) -> &ReminderService<N, C> {
        &self.reminders
    }

    /// Validates and saves a new task, then schedules its notifications and,
    /// for a repeating root task, materializes the first occurrence.
    pub async fn create_task(&self, task: Task) -> Result<CreationResult, CoreError> {
        task.validate()?;
        self.repository.save(&task).await?;
        info!(task_id = %task.id, title = %task.title, "task created");

        let (alarm, reminders) = self.schedule_notifications(&task).await;

        let next_occurrence = match self.generator.on_created(&task, self.reminders.now()) {
            Ok(Some(occurrence)) => match self.persist_occurrence(occurrence).await {
                Ok(occurrence) => Some(occurrence),
                Err(e) => {
                    warn!(task_id = %task.id, error = %e, "failed to save first occurrence");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(task_id = %task.id, error = %e, "failed to generate first occurrence");
                None
            }
        };

        Ok(CreationResult {
            task,
            alarm,
            reminders,
            next_occurrence,
        })
    }

    /// Marks a task completed, withdraws its notifications and materializes
    /// the next occurrence of a repeating series.
    pub async fn complete_task(&self, id: Uuid) -> Result<CompletionResult, CoreError> {
        let mut task = self.load(id).await?;
        if task.is_completed {
            debug!(task_id = %id, "task already completed");
            return Ok(CompletionResult::Single(task));
        }

        let now = self.reminders.now();
        task.is_completed = true;
        task.completed_at = Some(now);

        if let Err(e) = self.reminders.cancel_all(task.id).await {
            warn!(task_id = %task.id, error = %e, "failed to cancel notifications");
        }
        self.repository.save(&task).await?;
        info!(task_id = %task.id, "task completed");

        if !task.is_repeating {
            return Ok(CompletionResult::Single(task));
        }

        match self.generator.on_completed(&task, now) {
            Ok(Some(occurrence)) => {
                let next = self.persist_occurrence(occurrence).await?;
                Ok(CompletionResult::Recurring {
                    completed: task,
                    next,
                })
            }
            Ok(None) => {
                info!(task_id = %task.id, "recurring series ended");
                Ok(CompletionResult::SeriesEnded { completed: task })
            }
            Err(e) => {
                warn!(task_id = %task.id, error = %e, "failed to generate next occurrence");
                Ok(CompletionResult::SeriesEnded { completed: task })
            }
        }
    }

    /// Cancels a task's notifications and removes it.
    pub async fn delete_task(&self, id: Uuid) -> Result<(), CoreError> {
        if let Err(e) = self.reminders.cancel_all(id).await {
            warn!(task_id = %id, error = %e, "failed to cancel notifications");
        }
        self.repository.delete(id).await?;
        info!(task_id = %id, "task deleted");
        Ok(())
    }

    /// Replaces every pending notification of a task, e.g. after it was edited.
    pub async fn reschedule_reminders(&self, id: Uuid) -> Result<ScheduleReport, CoreError> {
        let task = self.load(id).await?;
        self.reminders.cancel_all(task.id).await?;

        if let Err(e) = self.reminders.schedule_alarm(&task).await {
            warn!(task_id = %task.id, error = %e, "failed to reschedule alarm");
        }
        self.reminders.schedule(&task).await
    }

    /// Delivery callback for open-ended reminders: queues the following one.
    pub async fn handle_delivery(
        &self,
        id: Uuid,
        delivered_at: DateTime<Utc>,
    ) -> Result<Option<NotificationId>, CoreError> {
        let task = self.load(id).await?;
        self.reminders.schedule_next(&task, delivered_at).await
    }

    async fn load(&self, id: Uuid) -> Result<Task, CoreError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| CoreError::NotFound(id.to_string()))
    }

    async fn schedule_notifications(
        &self,
        task: &Task,
    ) -> (
        Option<Result<NotificationId, CoreError>>,
        Option<Result<ScheduleReport, CoreError>>,
    ) {
        let alarm = match self.reminders.schedule_alarm(task).await {
            Ok(Some(id)) => Some(Ok(id)),
            Ok(None) => None,
            Err(e) => {
                warn!(task_id = %task.id, error = %e, "failed to schedule alarm");
                Some(Err(e))
            }
        };

        let reminders = if task.reminder_enabled {
            let result = self.reminders.schedule(task).await;
            if let Err(e) = &result {
                warn!(task_id = %task.id, error = %e, "failed to schedule reminders");
            }
            Some(result)
        } else {
            None
        };

        (alarm, reminders)
    }

    /// Saves a generated occurrence and schedules its notifications.
    ///
    /// An occurrence already stored for the same series and target time is
    /// returned instead of saving a duplicate.
    async fn persist_occurrence(&self, occurrence: Task) -> Result<Task, CoreError> {
        if let (Some(root), Some(target)) = (occurrence.parent_task_id, occurrence.target_time()) {
            let siblings = self.repository.find_children(root).await?;
            if let Some(existing) = siblings
                .into_iter()
                .find(|sibling| sibling.target_time() == Some(target))
            {
                debug!(task_id = %existing.id, %target, "occurrence already exists");
                return Ok(existing);
            }
        }

        self.repository.save(&occurrence).await?;
        info!(
            task_id = %occurrence.id,
            parent_id = ?occurrence.parent_task_id,
            target = ?occurrence.target_time(),
            "occurrence created"
        );
        self.schedule_notifications(&occurrence).await;
        Ok(occurrence)
    }
}
