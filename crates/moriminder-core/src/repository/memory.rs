//! In-memory task repository for tests and simulations.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::Task;
use crate::repository::TaskRepository;

/// Thread-safe in-memory task repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    state: Arc<RwLock<HashMap<Uuid, Task>>>,
}

fn poisoned(err: impl std::fmt::Display) -> CoreError {
    CoreError::PersistenceFailed(format!("task store poisoned: {}", err))
}

impl InMemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.state.read().map(|tasks| tasks.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn save(&self, task: &Task) -> Result<(), CoreError> {
        let mut tasks = self.state.write().map_err(poisoned)?;
        tasks.insert(task.id, task.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Task>, CoreError> {
        let tasks = self.state.read().map_err(poisoned)?;
        Ok(tasks.get(&id).cloned())
    }

    async fn delete(&self, id: Uuid) -> Result<(), CoreError> {
        let mut tasks = self.state.write().map_err(poisoned)?;
        tasks
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| CoreError::NotFound(id.to_string()))
    }

    async fn find_children(&self, parent_id: Uuid) -> Result<Vec<Task>, CoreError> {
        let tasks = self.state.read().map_err(poisoned)?;
        let mut children: Vec<Task> = tasks
            .values()
            .filter(|task| task.parent_task_id == Some(parent_id))
            .cloned()
            .collect();
        children.sort_by_key(|task| (task.created_at, task.id));
        Ok(children)
    }
}
