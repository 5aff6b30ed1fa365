use anyhow::Result;
use chrono::Utc;
use moriminder_core::models::ReminderConfig;
use moriminder_core::recurrence::RecurrenceResolver;
use owo_colors::OwoColorize;

use crate::cli::NextCommand;
use crate::parser::{parse_optional_date, parse_pattern};
use crate::timezone::format_local;
use crate::views::table::display_occurrences;

pub fn preview_occurrences(command: NextCommand, config: &ReminderConfig) -> Result<()> {
    let resolver = RecurrenceResolver::from_config(config)?;
    let tz = *resolver.timezone();
    let pattern = parse_pattern(&command.pattern)?;

    let now = Utc::now();
    let from = parse_optional_date(command.from.as_deref(), now, &tz)?.unwrap_or(now);
    let until = parse_optional_date(command.until.as_deref(), now, &tz)?;

    if command.json {
        println!("{}", pattern.to_legacy_json()?);
    }

    let occurrences = resolver.preview(&pattern, from, command.count, until)?;

    println!(
        "{} {} from {} ({})",
        "Pattern:".bold(),
        pattern,
        format_local(from, &tz),
        tz.name()
    );
    display_occurrences(&occurrences, from, &tz);

    if let Some(until) = until {
        if occurrences.len() < command.count {
            println!("Series ends: no occurrence after {}", format_local(until, &tz));
        }
    }
    Ok(())
}
