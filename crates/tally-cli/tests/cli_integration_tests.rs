/// CLI integration tests for tally
///
/// These tests run the binary as a black box against a temporary database
/// and state file.
use predicates::prelude::*;

mod helpers;
use helpers::{assertions, extract_uuid, CliTestHarness, TestFixtures};

#[test]
fn test_cli_help_and_version() {
    let harness = CliTestHarness::new();

    harness
        .run_success(&["--help"])
        .stdout(predicate::str::contains("Recurring income and expenses"));

    harness
        .run_success(&["--version"])
        .stdout(predicate::str::contains("tally"));

    harness
        .run_failure(&["invalid-command"])
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_category_commands() {
    let harness = CliTestHarness::new();

    harness
        .run_success(&["category", "list"])
        .stdout(predicate::str::contains("No categories found"));

    harness
        .run_success(&["category", "add", "Groceries"])
        .stdout(predicate::str::contains("Added category"));

    harness
        .run_failure(&["category", "add", "Groceries"])
        .stderr(predicate::str::contains("already exists"));

    harness
        .run_success(&["category", "list"])
        .stdout(predicate::str::contains("Groceries"));
}

#[test]
fn test_recurring_add_validation() {
    let harness = CliTestHarness::new();
    harness.run_success(&["category", "add", "Car"]);

    let mut args = TestFixtures::bounded_monthly_args();
    args[5] = "0,00";
    harness
        .run_failure(&args)
        .stderr(predicate::str::contains("Amount must be a number greater than zero"));

    let mut args = TestFixtures::bounded_monthly_args();
    args.extend(["--every", "0"]);
    harness
        .run_failure(&args)
        .stderr(predicate::str::contains("between 1 and 1000"));

    let mut args = TestFixtures::bounded_monthly_args();
    args[13] = "2024-01-01";
    harness
        .run_failure(&args)
        .stderr(predicate::str::contains("End date must be after the start date"));

    let mut args = TestFixtures::bounded_monthly_args();
    args[7] = "Boats";
    harness
        .run_failure(&args)
        .stderr(predicate::str::contains("Category 'Boats' not found"));

    harness
        .run_success(&["recurring", "list"])
        .stdout(predicate::str::contains("No recurring transactions found"));
}

#[test]
fn test_recurring_add_then_list_catches_up() {
    let harness = CliTestHarness::new();
    harness.run_success(&["category", "add", "Car"]);

    harness
        .run_success(&TestFixtures::bounded_monthly_args())
        .stdout(predicate::str::contains("Created recurring transaction"));

    // Listing runs the automatic catch-up first.
    harness
        .run_success(&["list"])
        .stdout(predicate::str::contains("Added 4 recurring transactions"))
        .stdout(assertions::has_transaction_table_headers())
        .stdout(predicate::str::contains("-43.00"))
        .stdout(predicate::str::contains("2024-04-15"))
        .stdout(predicate::str::contains("2024-05-15").not());
    assert!(harness.state_path().exists());

    // The throttle now holds back a plain sync.
    harness
        .run_success(&["sync"])
        .stdout(predicate::str::contains("--force"));

    harness
        .run_success(&["sync", "--force"])
        .stdout(predicate::str::contains("No recurring transactions were due"));

    harness
        .run_success(&["list"])
        .stdout(predicate::str::contains("Added").not());
}

#[test]
fn test_preview_and_filtered_list() {
    let harness = CliTestHarness::new();
    harness.run_success(&["category", "add", "Bills"]);

    let output = harness.stdout_of(&[
        "recurring", "add",
        "--title", "Phone",
        "--amount", "20",
        "--category", "Bills",
        "--unit", "month",
        "--start", "2024-01-31",
    ]);
    let id = extract_uuid(&output).expect("no template id in output");
    let prefix = &id[..8];

    harness
        .run_success(&["recurring", "preview", prefix, "--count", "3"])
        .stdout(predicate::str::contains("2024-01-31"))
        .stdout(predicate::str::contains("2024-02-29"))
        .stdout(predicate::str::contains("2024-03-29"));

    harness.run_success(&["sync", "--force"]);

    harness
        .run_success(&["list", "--template", prefix])
        .stdout(predicate::str::contains("Phone"))
        .stdout(predicate::str::contains("-20.00"));

    harness
        .run_failure(&["recurring", "preview", "zz"])
        .stderr(predicate::str::contains("No recurring transaction found"));

    harness
        .run_failure(&["recurring", "preview", "x"])
        .stderr(assertions::has_error());
}

#[test]
fn test_deposit_kind_and_tags() {
    let harness = CliTestHarness::new();
    harness.run_success(&["category", "add", "Salary"]);

    harness.run_success(&[
        "recurring", "add",
        "--title", "Paycheck",
        "--amount", "2.500,00",
        "--kind", "deposit",
        "--category", "Salary",
        "--every", "2",
        "--unit", "week",
        "--start", "2024-01-05",
        "--end", "2024-01-20",
        "--tag", "work",
    ]);

    harness
        .run_success(&["sync"])
        .stdout(predicate::str::contains("Added 2 recurring transactions"));

    harness
        .run_success(&["list"])
        .stdout(predicate::str::contains("2,500.00"))
        .stdout(predicate::str::contains("work"))
        .stdout(predicate::str::contains("2024-01-19"));

    harness
        .run_failure(&[
            "recurring", "add",
            "--title", "Bonus",
            "--amount", "100",
            "--kind", "gift",
            "--category", "Salary",
        ])
        .stderr(predicate::str::contains("error"));
}
