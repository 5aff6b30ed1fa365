//! # Moriminder Core Library
//!
//! The reminder scheduling engine behind Moriminder: it decides when a task's
//! repeating reminders fire, keeps the number of pending notifications under
//! the platform ceiling, and generates the occurrences of repeating tasks.
//!
//! ## Core Modules
//!
//! - [`interval`]: Reminder cadence from a task's priority and kind
//! - [`scheduler`]: Forward and backward planning of concrete fire times
//! - [`budget`]: The shared ceiling on pending notifications
//! - [`recurrence`]: Recurrence patterns, next-occurrence resolution and occurrence generation
//! - [`timezone`]: Timezone validation and DST-safe local time resolution
//! - [`notifications`]: Port to the notification subsystem, with an in-memory adapter
//! - [`repository`]: Task persistence port, with an in-memory adapter
//! - [`service`]: Task lifecycle and reminder dispatch over the ports
//! - [`models`], [`error`]: Data structures and the error taxonomy
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use chrono::{Duration, Utc};
//! use mockable::DefaultClock;
//! use moriminder_core::{
//!     models::{ReminderConfig, Task, TaskPriority},
//!     notifications::InMemoryNotificationCenter,
//!     recurrence::{RecurrenceResolver, RecurringTaskGenerator},
//!     repository::InMemoryTaskRepository,
//!     service::{ReminderService, TaskService},
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ReminderConfig::default();
//!     let reminders = Arc::new(ReminderService::new(
//!         Arc::new(InMemoryNotificationCenter::new()),
//!         Arc::new(DefaultClock),
//!         &config,
//!     ));
//!     let generator = RecurringTaskGenerator::new(RecurrenceResolver::from_config(&config)?);
//!     let tasks = TaskService::new(Arc::new(InMemoryTaskRepository::new()), reminders, generator);
//!
//!     let created = tasks
//!         .create_task(Task {
//!             title: "Daily standup".to_string(),
//!             priority: Some(TaskPriority::High),
//!             deadline: Some(Utc::now() + Duration::hours(3)),
//!             reminder_enabled: true,
//!             is_repeating: true,
//!             recurrence: Some("daily".parse()?),
//!             ..Default::default()
//!         })
//!         .await?;
//!
//!     println!("Created task: {}", created.task.title);
//!     Ok(())
//! }
//! ```

pub mod budget;
pub mod error;
pub mod interval;
pub mod models;
pub mod notifications;
pub mod recurrence;
pub mod repository;
pub mod scheduler;
pub mod service;
pub mod timezone;
