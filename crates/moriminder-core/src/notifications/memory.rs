//! In-memory notification center for tests and dry runs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::{NotificationId, NotificationRequest};
use crate::notifications::NotificationCenter;

/// Thread-safe notification center that records every scheduled request.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotificationCenter {
    state: Arc<RwLock<NotificationState>>,
}

#[derive(Debug, Default)]
struct NotificationState {
    pending: HashMap<NotificationId, NotificationRequest>,
    /// Pending notifications owned by other apps or tasks we do not track
    foreign_pending: usize,
    failing_fire_times: HashSet<DateTime<Utc>>,
}

fn poisoned(err: impl std::fmt::Display) -> CoreError {
    CoreError::DispatchFailed(format!("notification state poisoned: {}", err))
}

impl InMemoryNotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with `count` notifications already pending that belong to no task.
    pub fn with_foreign_pending(count: usize) -> Self {
        let center = Self::default();
        if let Ok(mut state) = center.state.write() {
            state.foreign_pending = count;
        }
        center
    }

    /// Makes `schedule` fail for requests firing at `fire_time`.
    pub fn fail_at(&self, fire_time: DateTime<Utc>) {
        if let Ok(mut state) = self.state.write() {
            state.failing_fire_times.insert(fire_time);
        }
    }

    /// Pending requests for one task, ordered by fire time.
    pub fn pending_for(&self, task_id: Uuid) -> Vec<NotificationRequest> {
        let Ok(state) = self.state.read() else {
            return Vec::new();
        };
        let mut requests: Vec<NotificationRequest> = state
            .pending
            .values()
            .filter(|request| request.task_id == task_id)
            .copied()
            .collect();
        requests.sort_by_key(|request| request.fire_time);
        requests
    }
}

#[async_trait]
impl NotificationCenter for InMemoryNotificationCenter {
    async fn pending_count(&self) -> Result<usize, CoreError> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state.pending.len() + state.foreign_pending)
    }

    async fn schedule(&self, request: NotificationRequest) -> Result<NotificationId, CoreError> {
        let mut state = self.state.write().map_err(poisoned)?;
        if state.failing_fire_times.contains(&request.fire_time) {
            return Err(CoreError::DispatchFailed(format!(
                "{} for task {} at {} was rejected",
                request.kind, request.task_id, request.fire_time
            )));
        }

        let id = Uuid::now_v7();
        state.pending.insert(id, request);
        Ok(id)
    }

    async fn cancel_all(&self, task_id: Uuid) -> Result<usize, CoreError> {
        let mut state = self.state.write().map_err(poisoned)?;
        let before = state.pending.len();
        state.pending.retain(|_, request| request.task_id != task_id);
        Ok(before - state.pending.len())
    }
}
