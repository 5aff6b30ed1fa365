use chrono::{DateTime, Utc};
use chrono_humanize::HumanTime;
use chrono_tz::Tz;
use comfy_table::{Attribute, Cell, Color, Row, Table};
use moriminder_core::models::NotificationKind;

use crate::timezone::format_local;

#[derive(Debug, Clone)]
pub struct ViewNotification {
    pub fire_time: DateTime<Utc>,
    pub kind: NotificationKind,
}

/// Table of planned notifications, relative to the reference time `now`
pub fn display_notifications(notifications: &[ViewNotification], now: DateTime<Utc>, tz: &Tz) {
    if notifications.is_empty() {
        println!("No notifications planned.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["#", "Kind", "Fires At", "Relative"]);

    for (index, notification) in notifications.iter().enumerate() {
        let mut row = Row::new();
        row.add_cell(Cell::new(index + 1));

        let kind_cell = match notification.kind {
            NotificationKind::Alarm => Cell::new("alarm")
                .fg(Color::Red)
                .add_attribute(Attribute::Bold),
            NotificationKind::Reminder => Cell::new("reminder"),
        };
        row.add_cell(kind_cell);

        row.add_cell(Cell::new(format_local(notification.fire_time, tz)));
        row.add_cell(relative_cell(notification.fire_time, now, tz));
        table.add_row(row);
    }

    println!("{table}");
}

/// Table of upcoming occurrences of a pattern
pub fn display_occurrences(occurrences: &[DateTime<Utc>], from: DateTime<Utc>, tz: &Tz) {
    if occurrences.is_empty() {
        println!("No occurrences found.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["#", "Occurs On", "Relative"]);

    for (index, occurrence) in occurrences.iter().enumerate() {
        let mut row = Row::new();
        row.add_cell(Cell::new(index + 1));
        row.add_cell(Cell::new(format_local(*occurrence, tz)));
        row.add_cell(relative_cell(*occurrence, from, tz));
        table.add_row(row);
    }

    println!("{table}");
}

fn relative_cell(at: DateTime<Utc>, now: DateTime<Utc>, tz: &Tz) -> Cell {
    let text = HumanTime::from(at - now).to_string();
    if at.with_timezone(tz).date_naive() == now.with_timezone(tz).date_naive() {
        Cell::new(text).fg(Color::Yellow) // same day
    } else {
        Cell::new(text)
    }
}
