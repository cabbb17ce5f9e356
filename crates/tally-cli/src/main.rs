use clap::Parser;
use owo_colors::{OwoColorize, Style};
use tally_core::db;
use tally_core::error::CoreError;
use tally_core::repository::SqliteRepository;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod config;
mod parser;
mod util;
mod views;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::Cli::parse();

    let config = match config::Config::new() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %e, "invalid configuration, using defaults");
            config::Config::default()
        }
    };

    let db_pool = match db::establish_connection(&config.database_path).await {
        Ok(pool) => pool,
        Err(e) => {
            handle_error(e.into());
            std::process::exit(1);
        }
    };
    let repository = SqliteRepository::new(db_pool);

    let result = match cli.command {
        cli::Commands::Category(command) => {
            commands::category::category_command(&repository, command).await
        }
        cli::Commands::Recurring(command) => {
            commands::recurring::recurring_command(&repository, &config, command).await
        }
        cli::Commands::Sync(command) => commands::sync::sync(&repository, &config, command).await,
        cli::Commands::List(command) => {
            if config.auto_sync {
                commands::sync::auto_sync(&repository, &config).await;
            }
            commands::list::list_transactions(&repository, &config, command).await
        }
    };

    if let Err(e) = result {
        handle_error(e);
        std::process::exit(1);
    }
}

fn handle_error(err: anyhow::Error) {
    let error_style = Style::new().red().bold();

    if let Some(core_error) = err.downcast_ref::<CoreError>() {
        match core_error {
            CoreError::NotFound(s) => {
                eprintln!("{} {}", "Error:".style(error_style), s);
            }
            CoreError::Validation(v) => {
                eprintln!("{} {}", "Error:".style(error_style), v);
            }
            CoreError::AmbiguousId(templates) => {
                eprintln!("{}", "Error: Ambiguous ID.".style(error_style));
                eprintln!("Did you mean one of these?");
                for (id, title) in templates {
                    eprintln!("  {} ({})", id.yellow(), title);
                }
            }
            CoreError::InvalidInput(s) => {
                eprintln!("{} Invalid input: {}", "Error:".style(error_style), s);
            }
            CoreError::InvalidTimezone(s) => {
                eprintln!(
                    "{} Unknown timezone '{}'. Use an IANA name such as 'Europe/Berlin'.",
                    "Error:".style(error_style),
                    s.yellow()
                );
            }
            other if other.is_storage() => {
                eprintln!("{} {}", "Error:".style(error_style), err);
                if let Some(source) = std::error::Error::source(other) {
                    eprintln!("  caused by: {}", source);
                }
            }
            _ => eprintln!("{} {}", "Error:".style(error_style), err),
        }
    } else {
        eprintln!("{} {:#}", "Error:".style(error_style), err);
    }
}
