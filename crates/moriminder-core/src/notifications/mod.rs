//! Port to the platform notification subsystem.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::{NotificationId, NotificationRequest};

pub mod memory;

pub use memory::InMemoryNotificationCenter;

/// Delivers notifications on behalf of the reminder engine.
///
/// Implementations enforce nothing about the platform ceiling themselves;
/// callers go through [`crate::budget::NotificationBudget`] first.
#[async_trait]
pub trait NotificationCenter: Send + Sync {
    /// Number of notifications currently pending delivery, across all tasks.
    async fn pending_count(&self) -> Result<usize, CoreError>;

    /// Schedules one notification, returning its handle.
    async fn schedule(&self, request: NotificationRequest) -> Result<NotificationId, CoreError>;

    /// Withdraws every pending notification belonging to a task.
    /// Returns how many were removed.
    async fn cancel_all(&self, task_id: Uuid) -> Result<usize, CoreError>;
}
