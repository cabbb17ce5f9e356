use crate::cli::SyncCommand;
use crate::config::Config;
use anyhow::Result;
use owo_colors::{OwoColorize, Style};
use tally_core::engine::{CatchUp, CatchUpResult, MaterializationEngine, ScanSummary};
use tally_core::repository::SqliteRepository;
use tally_core::state::JsonFileStore;
use tally_core::throttle::{Clock, SystemClock, ThrottleGate};

pub type CliCatchUp = CatchUp<SqliteRepository, JsonFileStore, SystemClock>;

pub fn catch_up_runner(repo: &SqliteRepository, config: &Config) -> Result<CliCatchUp> {
    let engine = MaterializationEngine::new(repo.clone(), config.engine.clone())?;
    let throttle = ThrottleGate::new(
        JsonFileStore::new(&config.state_path),
        SystemClock,
        config.engine.throttle_interval_secs,
    );
    Ok(CatchUp::new(engine, throttle))
}

pub async fn sync(repo: &SqliteRepository, config: &Config, command: SyncCommand) -> Result<()> {
    let runner = catch_up_runner(repo, config)?;

    match runner.run(command.force).await? {
        CatchUpResult::Throttled { last_check } => {
            let minutes = (runner.throttle().clock().now() - last_check).max(0) / 60;
            println!(
                "{} Last sync was {} minutes ago; nothing to do. Use --force to sync anyway.",
                "→".style(Style::new().blue()),
                minutes
            );
        }
        CatchUpResult::AlreadyRunning => {
            println!("{} A sync is already running.", "→".style(Style::new().blue()));
        }
        CatchUpResult::Completed(summary) => print_summary(&summary),
    }

    Ok(())
}

/// Throttled catch-up run before showing the ledger. Failures are reported
/// but never stop the command that triggered it.
pub async fn auto_sync(repo: &SqliteRepository, config: &Config) {
    let result = match catch_up_runner(repo, config) {
        Ok(runner) => runner.run(false).await.map_err(anyhow::Error::from),
        Err(e) => Err(e),
    };

    match result {
        Ok(CatchUpResult::Completed(summary)) => {
            if summary.added_count > 0 || summary.has_errors() {
                print_summary(&summary);
            }
        }
        Ok(_) => {}
        Err(e) => tracing::warn!(error = %e, "automatic sync failed"),
    }
}

pub fn print_summary(summary: &ScanSummary) {
    let success_style = Style::new().green().bold();
    let warning_style = Style::new().yellow().bold();
    let subtle_style = Style::new().bright_black();

    if summary.added_count == 0 {
        println!(
            "{} No recurring transactions were due.",
            "✓".style(success_style)
        );
    } else {
        println!(
            "{} Added {} recurring transaction{}",
            "✓".style(success_style),
            summary.added_count,
            if summary.added_count == 1 { "" } else { "s" }
        );
    }

    for id in &summary.capped_templates {
        println!(
            "  {} {} has more occurrences pending; run sync again to continue",
            "!".style(warning_style),
            (&id.to_string()[..8]).yellow()
        );
    }

    for failure in &summary.template_errors {
        eprintln!(
            "  {} {} ({}): {}",
            "✗".style(Style::new().red().bold()),
            failure.title,
            &failure.template_id.to_string()[..8],
            failure.error
        );
    }

    println!(
        "  {} checked {} recurring transaction{} in {} ms",
        "•".style(subtle_style),
        summary.templates_processed,
        if summary.templates_processed == 1 { "" } else { "s" },
        summary.duration_ms
    );
}
