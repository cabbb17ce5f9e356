use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Test harness for running CLI commands against a temporary database
pub struct CliTestHarness {
    temp_dir: TempDir,
    db_path: PathBuf,
    state_path: PathBuf,
}

impl CliTestHarness {
    /// Create a new test harness with a temporary database and state file
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test.db");
        let state_path = temp_dir.path().join("state.json");

        Self {
            temp_dir,
            db_path,
            state_path,
        }
    }

    /// Get a Command instance configured for testing
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("tally").expect("Failed to find tally binary");

        // Run from the temp dir so no stray tally.toml is picked up.
        cmd.current_dir(self.temp_dir.path());
        cmd.env("TALLY_DATABASE_PATH", &self.db_path);
        cmd.env("TALLY_STATE_PATH", &self.state_path);
        cmd.env("TALLY_ENGINE__TIMEZONE", "UTC");
        cmd.env_remove("RUST_LOG");

        cmd
    }

    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    /// Helper to run a command and assert success
    pub fn run_success(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().success()
    }

    /// Helper to run a command and assert failure
    pub fn run_failure(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().failure()
    }

    /// Runs a command and returns its stdout
    pub fn stdout_of(&self, args: &[&str]) -> String {
        let output = self.run_success(args).get_output().stdout.clone();
        String::from_utf8(output).expect("stdout is not UTF-8")
    }
}

/// Common test fixtures
pub struct TestFixtures;

impl TestFixtures {
    /// A monthly expense with a fixed end, so the number of occurrences does
    /// not depend on today's date.
    pub fn bounded_monthly_args() -> Vec<&'static str> {
        vec![
            "recurring", "add",
            "--title", "Parking",
            "--amount", "43.00",
            "--category", "Car",
            "--unit", "month",
            "--start", "2024-01-15",
            "--end", "2024-04-15",
            "--tag", "car",
        ]
    }
}

/// Finds the first full UUID in `text`, ignoring any terminal colour codes.
pub fn extract_uuid(text: &str) -> Option<String> {
    text.split(|c: char| !(c.is_ascii_hexdigit() || c == '-'))
        .find(|token| token.len() == 36 && token.matches('-').count() == 4)
        .map(str::to_string)
}

/// Utility functions for test assertions
pub mod assertions {
    use super::*;

    pub fn has_transaction_table_headers() -> impl Predicate<str> {
        predicate::str::contains("Date")
            .and(predicate::str::contains("Title"))
            .and(predicate::str::contains("Amount"))
    }

    pub fn has_error() -> impl Predicate<str> {
        predicate::str::contains("Error").or(predicate::str::contains("error"))
    }
}
