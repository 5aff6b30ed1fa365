//! Orchestration over the notification and repository ports.

pub mod reminders;
pub mod tasks;

pub use reminders::ReminderService;
pub use tasks::TaskService;
