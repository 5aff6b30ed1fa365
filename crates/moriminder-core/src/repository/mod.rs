use async_trait::async_trait;
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::Task;

pub mod memory;

pub use memory::InMemoryTaskRepository;

/// Persistence port for tasks. The engine never owns task storage.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Inserts or replaces a task.
    async fn save(&self, task: &Task) -> Result<(), CoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Task>, CoreError>;
    /// Removes a task. Deleting an unknown id yields `CoreError::NotFound`.
    async fn delete(&self, id: Uuid) -> Result<(), CoreError>;
    /// Generated occurrences whose `parent_task_id` is `parent_id`, oldest first.
    async fn find_children(&self, parent_id: Uuid) -> Result<Vec<Task>, CoreError>;
}
