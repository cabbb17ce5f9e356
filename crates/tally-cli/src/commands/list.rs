use crate::cli::ListCommand;
use crate::config::Config;
use crate::util::resolve_template_id;
use crate::views::table::display_transactions;
use anyhow::Result;
use tally_core::repository::{SqliteRepository, TransactionRepository};
use tally_core::schedule::ScheduleCalculator;

pub async fn list_transactions(
    repo: &SqliteRepository,
    config: &Config,
    command: ListCommand,
) -> Result<()> {
    let timezone = ScheduleCalculator::from_timezone_name(&config.engine.timezone)?.timezone();

    let transactions = match command.template.as_deref() {
        Some(prefix) => {
            let template_id = resolve_template_id(repo, prefix).await?;
            repo.find_transactions_for_template(template_id).await?
        }
        None => repo.find_transactions().await?,
    };

    display_transactions(&transactions, timezone);
    Ok(())
}
