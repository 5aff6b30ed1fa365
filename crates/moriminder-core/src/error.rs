use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Notification limit reached: {pending}/{ceiling} notifications already pending")]
    BudgetExhausted { ceiling: usize, pending: usize },

    #[error("Failed to dispatch notification: {0}")]
    DispatchFailed(String),

    #[error("Invalid task: {0}")]
    InvalidTask(String),

    #[error("Invalid recurrence pattern: {0}")]
    InvalidPattern(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Failed to persist task: {0}")]
    PersistenceFailed(String),

    #[error("Task not found: {0}")]
    NotFound(String),
}
