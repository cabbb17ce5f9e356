use crate::cli::{CategoryAction, CategoryCommand};
use crate::views::table::display_categories;
use anyhow::Result;
use owo_colors::{OwoColorize, Style};
use tally_core::repository::CategoryRepository;

pub async fn category_command(repo: &impl CategoryRepository, command: CategoryCommand) -> Result<()> {
    match command.action {
        CategoryAction::Add { name } => {
            let category = repo.add_category(name).await?;
            println!(
                "{} Added category: {}",
                "✓".style(Style::new().green().bold()),
                category.name.bright_white().bold()
            );
        }
        CategoryAction::List => {
            let categories = repo.find_categories().await?;
            display_categories(&categories);
        }
    }
    Ok(())
}
