use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::notifications::NotificationCenter;

/// Guards the platform ceiling on simultaneously pending notifications.
///
/// The pending count is read live from the notification center on every
/// reservation. Slots handed out by [`reserve`](Self::reserve) stay counted as
/// held until returned with [`release`](Self::release), so two batches running
/// at once can never be granted the same free slots.
pub struct NotificationBudget<N: NotificationCenter + ?Sized> {
    center: Arc<N>,
    ceiling: usize,
    held: Mutex<usize>,
}

impl<N: NotificationCenter + ?Sized> NotificationBudget<N> {
    pub fn new(center: Arc<N>, ceiling: usize) -> Self {
        Self {
            center,
            ceiling,
            held: Mutex::new(0),
        }
    }

    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    /// Grants up to `requested` slots.
    ///
    /// # Returns
    /// * `Ok(granted)` - `min(requested, remaining)`, now held by the caller
    /// * `Err(CoreError::BudgetExhausted)` - no slot is free
    pub async fn reserve(&self, requested: usize) -> Result<usize, CoreError> {
        let mut held = self.held.lock().await;
        let pending = self.center.pending_count().await?;
        let in_use = pending + *held;
        let remaining = self.ceiling.saturating_sub(in_use);

        if remaining == 0 {
            warn!(ceiling = self.ceiling, pending, held = *held, "notification budget exhausted");
            return Err(CoreError::BudgetExhausted {
                ceiling: self.ceiling,
                pending: in_use,
            });
        }

        let granted = requested.min(remaining);
        if granted < requested {
            warn!(requested, granted, remaining, "notification request clipped by budget");
        }

        *held += granted;
        debug!(granted, held = *held, "reserved notification slots");
        Ok(granted)
    }

    /// Returns held slots. Releasing more than is held clamps at zero.
    pub async fn release(&self, slots: usize) {
        let mut held = self.held.lock().await;
        *held = held.saturating_sub(slots);
    }

    /// Free slots right now, for diagnostics.
    pub async fn remaining(&self) -> Result<usize, CoreError> {
        let held = self.held.lock().await;
        let pending = self.center.pending_count().await?;
        Ok(self.ceiling.saturating_sub(pending + *held))
    }

    pub async fn held(&self) -> usize {
        *self.held.lock().await
    }
}

impl<N: NotificationCenter + ?Sized> std::fmt::Debug for NotificationBudget<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationBudget")
            .field("ceiling", &self.ceiling)
            .finish_non_exhaustive()
    }
}
