/// CLI integration tests for moriminder
///
/// These run the binary as a black box against a fixed reference time.
use predicates::prelude::*;

mod helpers;
use helpers::{assertions, CliTestHarness, NOW};

#[test]
fn test_cli_help_and_version() {
    let harness = CliTestHarness::new();

    harness
        .run_success(&["--help"])
        .stdout(predicate::str::contains("Moriminder"));

    harness
        .run_success(&["--version"])
        .stdout(predicate::str::contains("moriminder"));

    harness
        .run_failure(&["invalid-command"])
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_plan_staged_event() {
    let harness = CliTestHarness::new();

    harness
        .run_success(&[
            "plan",
            "Launch",
            "--priority",
            "high",
            "--start",
            "2025-11-11T12:00:00Z",
            "--now",
            NOW,
        ])
        .stdout(assertions::has_plan_summary())
        .stdout(predicate::str::contains("kind: scheduled_event"))
        .stdout(predicate::str::contains("intervals: 360, 180, 60, 30, 15, 5, 1 min"))
        .stdout(predicate::str::contains("mode: backward"))
        .stdout(predicate::str::contains("cap: 15"))
        .stdout(predicate::str::contains("planned: 15"));
}

#[test]
fn test_plan_forward_clipped_by_pending() {
    let harness = CliTestHarness::new();

    harness
        .run_success(&[
            "plan",
            "Report",
            "--deadline",
            "2025-11-09T17:00:00Z",
            "--reminder-start",
            "2025-11-09T13:00:00Z",
            "--interval",
            "30",
            "--pending",
            "62",
            "--now",
            NOW,
        ])
        .stdout(predicate::str::contains("mode: forward"))
        .stdout(predicate::str::contains("granted: 2"))
        .stdout(predicate::str::contains("planned: 2"))
        .stdout(predicate::str::contains("2025-11-09 13:30"))
        .stdout(predicate::str::contains("2025-11-09 14:00"));
}

#[test]
fn test_plan_with_alarm() {
    let harness = CliTestHarness::new();

    harness
        .run_success(&[
            "plan",
            "Pills",
            "--deadline",
            "2025-11-09T15:00:00Z",
            "--alarm",
            "2025-11-09T14:45:00Z",
            "--now",
            NOW,
        ])
        .stdout(predicate::str::contains("alarm"))
        .stdout(predicate::str::contains("2025-11-09 14:45"));
}

#[test]
fn test_plan_budget_exhausted() {
    let harness = CliTestHarness::new();

    harness
        .run_failure(&[
            "plan",
            "Full",
            "--deadline",
            "2025-11-10T12:00:00Z",
            "--pending",
            "64",
            "--now",
            NOW,
        ])
        .stderr(assertions::has_error())
        .stderr(predicate::str::contains("Notification budget exhausted"));
}

#[test]
fn test_plan_rejects_invalid_task() {
    let harness = CliTestHarness::new();

    harness
        .run_failure(&[
            "plan",
            "Backwards",
            "--start",
            "2025-11-10T12:00:00Z",
            "--deadline",
            "2025-11-10T10:00:00Z",
            "--now",
            NOW,
        ])
        .stderr(predicate::str::contains("Invalid task"));

    harness
        .run_failure(&["plan", "Bad", "--priority", "urgent"])
        .stderr(predicate::str::contains("urgent"));
}

#[test]
fn test_plan_uses_config_ceiling() {
    let harness = CliTestHarness::new().with_config(
        r#"
        [reminders]
        notification_ceiling = 5
        "#,
    );

    harness
        .run_success(&[
            "plan",
            "Small device",
            "--deadline",
            "2025-11-10T12:00:00Z",
            "--pending",
            "3",
            "--now",
            NOW,
        ])
        .stdout(predicate::str::contains("granted: 2"))
        .stdout(predicate::str::contains("pending before: 3/5"));
}

#[test]
fn test_next_daily() {
    let harness = CliTestHarness::new();

    harness
        .run_success(&["next", "daily", "--from", "2025-11-09T09:00:00Z", "--count", "3"])
        .stdout(predicate::str::contains("2025-11-10 09:00"))
        .stdout(predicate::str::contains("2025-11-11 09:00"))
        .stdout(predicate::str::contains("2025-11-12 09:00"))
        .stdout(predicate::str::contains("2025-11-13").not());
}

#[test]
fn test_next_fifth_weekday_skips_short_month() {
    let harness = CliTestHarness::new();

    harness
        .run_success(&["next", "nth:fri:5", "--from", "2025-11-03T07:15:00Z", "--count", "1"])
        .stdout(predicate::str::contains("2026-01-30 07:15"));
}

#[test]
fn test_next_until_ends_series() {
    let harness = CliTestHarness::new();

    harness
        .run_success(&[
            "next",
            "weekly",
            "--from",
            "2025-11-09T09:00:00Z",
            "--until",
            "2025-11-25T00:00:00Z",
            "--count",
            "5",
        ])
        .stdout(predicate::str::contains("2025-11-16 09:00"))
        .stdout(predicate::str::contains("2025-11-23 09:00"))
        .stdout(predicate::str::contains("Series ends"));
}

#[test]
fn test_next_stored_json_pattern() {
    let harness = CliTestHarness::new();

    harness
        .run_success(&[
            "next",
            r#"{"type":"nthWeekdayOfMonth","weekday":2,"week":1}"#,
            "--json",
            "--from",
            "2025-11-20T10:00:00Z",
            "--count",
            "1",
        ])
        .stdout(predicate::str::contains(r#""type":"nthWeekdayOfMonth""#))
        .stdout(predicate::str::contains("2025-12-01 10:00"));
}

#[test]
fn test_next_invalid_inputs() {
    let harness = CliTestHarness::new();

    harness
        .run_failure(&["next", "fortnightly"])
        .stderr(predicate::str::contains("Invalid recurrence pattern"));

    harness
        .run_failure(&["next", r#"{"type":"everyNDays","interval":0}"#])
        .stderr(predicate::str::contains("Invalid recurrence pattern"));

    harness
        .run_failure(&["next", "every:4294967295h", "--from", NOW])
        .stderr(predicate::str::contains("out of the supported date range"));

    harness
        .bare_command()
        .args(["--timezone", "Mars/Olympus", "next", "daily"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown timezone"));
}
