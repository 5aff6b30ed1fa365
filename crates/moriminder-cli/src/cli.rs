use clap::{Parser, Subcommand};
use moriminder_core::models::{TaskKind, TaskPriority};

/// Preview Moriminder reminder plans and recurring task occurrences
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// IANA timezone for reading and printing dates (e.g. 'Europe/Paris', 'pst')
    #[arg(long, global = true)]
    pub timezone: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Plan the reminders Moriminder would schedule for a task
    Plan(PlanCommand),
    /// Preview the upcoming occurrences of a recurrence pattern
    Next(NextCommand),
}

#[derive(Parser, Debug, Clone)]
pub struct PlanCommand {
    /// The title of the task
    pub title: String,

    /// The priority of the task (low, medium, high)
    #[arg(short, long)]
    pub priority: Option<TaskPriority>,

    /// What the task's dates mean (task, event)
    #[arg(short, long)]
    pub kind: Option<TaskKind>,

    /// Treat the task as a legacy record with no priority or kind
    #[arg(long, conflicts_with_all = ["priority", "kind"])]
    pub no_metadata: bool,

    /// Deadline of the task (e.g. 'tomorrow 5pm', '2025-12-01T09:00:00Z')
    #[arg(short, long)]
    pub deadline: Option<String>,

    /// Start time of an event
    #[arg(short, long)]
    pub start: Option<String>,

    /// Reminder interval in minutes for deadline tasks
    #[arg(short, long)]
    pub interval: Option<u32>,

    /// When reminders may begin; switches planning to forward mode
    #[arg(long)]
    pub reminder_start: Option<String>,

    /// Latest time a reminder may fire
    #[arg(long)]
    pub reminder_end: Option<String>,

    /// One-shot alarm time
    #[arg(long)]
    pub alarm: Option<String>,

    /// Plan as a generated occurrence of a repeating task
    #[arg(long)]
    pub instance: bool,

    /// Notifications already pending on the device
    #[arg(long, default_value_t = 0)]
    pub pending: usize,

    /// Reference time used as "now" (defaults to the current time)
    #[arg(long)]
    pub now: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct NextCommand {
    /// Pattern: daily, weekly, monthly, yearly, every:3d, every:6h, nth:mon:1,
    /// custom:mon,wed,fri, or a stored JSON pattern
    pub pattern: String,

    /// Reference date the occurrences follow (defaults to now)
    #[arg(short, long)]
    pub from: Option<String>,

    /// How many occurrences to show
    #[arg(short, long, default_value_t = 5)]
    pub count: usize,

    /// Last date the series may produce an occurrence on
    #[arg(short, long)]
    pub until: Option<String>,

    /// Print the pattern in the stored JSON shape
    #[arg(long)]
    pub json: bool,
}
