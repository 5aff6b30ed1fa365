use assert_cmd::Command;
use std::path::Path;
use tempfile::TempDir;

/// Fixed reference time so plans are reproducible
pub const NOW: &str = "2025-11-09T12:00:00Z";

/// Test harness running the CLI inside an isolated working directory
pub struct CliTestHarness {
    temp_dir: TempDir,
}

impl CliTestHarness {
    /// Create a new test harness with an empty working directory
    pub fn new() -> Self {
        Self {
            temp_dir: tempfile::tempdir().expect("Failed to create temp directory"),
        }
    }

    /// Write `moriminder.toml` into the working directory
    pub fn with_config(self, contents: &str) -> Self {
        std::fs::write(self.dir().join("moriminder.toml"), contents)
            .expect("Failed to write config file");
        self
    }

    pub fn dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Command without a pinned timezone
    pub fn bare_command(&self) -> Command {
        let mut cmd = Command::cargo_bin("moriminder").expect("Failed to find moriminder binary");
        cmd.current_dir(self.dir())
            .env_remove("RUST_LOG")
            .env_remove("MORIMINDER_REMINDERS__TIMEZONE");
        cmd
    }

    /// Get a Command instance configured for testing
    pub fn command(&self) -> Command {
        let mut cmd = self.bare_command();
        cmd.args(["--timezone", "UTC"]);
        cmd
    }

    /// Helper to run a command and assert success
    pub fn run_success(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().success()
    }

    /// Helper to run a command and assert failure
    pub fn run_failure(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().failure()
    }
}

/// Utility functions for test assertions
pub mod assertions {
    use predicates::prelude::*;

    /// Predicate to check if output contains the plan summary lines
    pub fn has_plan_summary() -> impl Predicate<str> {
        predicate::str::contains("intervals:")
            .and(predicate::str::contains("mode:"))
            .and(predicate::str::contains("granted:"))
    }

    /// Predicate to check for error messages
    pub fn has_error() -> impl Predicate<str> {
        predicate::str::contains("Error")
    }
}
