use clap::Parser;
use moriminder_core::error::CoreError;
use owo_colors::{OwoColorize, Style};
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod config;
mod parser;
mod timezone;
mod views;

#[tokio::main]
async fn main() {
    // RUST_LOG overrides; engine logs stay quiet by default
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::Cli::parse();
    let config = config::Config::new().unwrap_or_else(|e| {
        warn!(error = %e, "failed to load {}, using defaults", config::CONFIG_FILE);
        config::Config::default()
    });

    if let Err(e) = run(cli, config).await {
        handle_error(e);
        std::process::exit(1);
    }
}

async fn run(cli: cli::Cli, mut config: config::Config) -> anyhow::Result<()> {
    let requested = cli
        .timezone
        .as_deref()
        .unwrap_or(config.reminders.timezone.as_str());
    let tz = timezone::normalize_timezone_input(requested)?;
    config.reminders.timezone = tz.name().to_string();

    match cli.command {
        cli::Commands::Plan(command) => {
            commands::plan::plan_reminders(command, &config.reminders, &tz).await
        }
        cli::Commands::Next(command) => {
            commands::next::preview_occurrences(command, &config.reminders)
        }
    }
}

fn handle_error(err: anyhow::Error) {
    let error_style = Style::new().red().bold();

    if let Some(core_error) = err.downcast_ref::<CoreError>() {
        match core_error {
            CoreError::BudgetExhausted { ceiling, pending } => {
                eprintln!(
                    "{} Notification budget exhausted: {} of {} slots in use",
                    "Error:".style(error_style),
                    pending.yellow(),
                    ceiling
                );
                eprintln!("Lower --pending or raise reminders.notification_ceiling.");
            }
            CoreError::InvalidPattern(s) => {
                eprintln!("{} Invalid recurrence pattern: {}", "Error:".style(error_style), s);
                eprintln!(
                    "Patterns: daily, weekly, monthly, yearly, every:<n>d, every:<n>h, nth:<weekday>:<week>, custom:<weekday>,..."
                );
            }
            CoreError::InvalidTask(s) => {
                eprintln!("{} Invalid task: {}", "Error:".style(error_style), s.yellow());
            }
            CoreError::InvalidTimezone(s) => {
                eprintln!("{} {}", "Error:".style(error_style), s);
            }
            _ => eprintln!("{} {}", "Error:".style(error_style), err),
        }
    } else {
        eprintln!("{} {:#}", "Error:".style(error_style), err);
    }
}
