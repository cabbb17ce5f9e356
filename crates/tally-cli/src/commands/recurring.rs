use crate::cli::{PreviewCommand, RecurringAction, RecurringAddCommand, RecurringCommand};
use crate::config::Config;
use crate::parser::parse_date;
use crate::util::resolve_template_id;
use crate::views::table::{display_templates, format_date, money};
use anyhow::Result;
use chrono::Utc;
use chrono_tz::Tz;
use owo_colors::{OwoColorize, Style};
use tally_core::error::CoreError;
use tally_core::models::{NewTemplateInput, RepeatUnit};
use tally_core::repository::{CategoryRepository, SqliteRepository, TemplateRepository};
use tally_core::schedule::ScheduleCalculator;
use tally_core::service::create_template;
use tally_core::state::JsonFileStore;
use tally_core::throttle::{SystemClock, ThrottleGate};

pub async fn recurring_command(
    repo: &SqliteRepository,
    config: &Config,
    command: RecurringCommand,
) -> Result<()> {
    let calculator = ScheduleCalculator::from_timezone_name(&config.engine.timezone)?;
    match command.action {
        RecurringAction::Add(add) => add_recurring(repo, config, calculator.timezone(), add).await,
        RecurringAction::List => list_recurring(repo, calculator.timezone()).await,
        RecurringAction::Preview(preview) => {
            preview_recurring(repo, config, &calculator, preview).await
        }
    }
}

async fn add_recurring(
    repo: &SqliteRepository,
    config: &Config,
    timezone: Tz,
    command: RecurringAddCommand,
) -> Result<()> {
    let category = repo
        .find_category_by_name(command.category.trim())
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("Category '{}' not found", command.category)))?;

    let start_date = match command.start.as_deref() {
        Some(start) => parse_date(start, timezone)?,
        None => {
            let today = Utc::now().with_timezone(&timezone).format("%Y-%m-%d").to_string();
            parse_date(&today, timezone)?
        }
    };
    let end_date = command
        .end
        .as_deref()
        .map(|end| parse_date(end, timezone))
        .transpose()?;

    let input = NewTemplateInput {
        title: command.title,
        amount: command.amount,
        kind: command.kind,
        category_id: Some(category.id),
        notes: command.notes,
        repeat_interval: command.every,
        repeat_unit: command.unit,
        start_date,
        end_date,
        tags: command.tag,
    };

    let template = create_template(repo, input).await?;

    // The new template should be picked up by the next automatic sync.
    let throttle = ThrottleGate::new(
        JsonFileStore::new(&config.state_path),
        SystemClock,
        config.engine.throttle_interval_secs,
    );
    if let Err(e) = throttle.reset_throttle().await {
        tracing::warn!(error = %e, "could not reset sync throttle");
    }

    let success_style = Style::new().green().bold();
    let info_style = Style::new().blue();
    let subtle_style = Style::new().bright_black();

    println!(
        "{} Created recurring transaction: {}",
        "✓".style(success_style),
        template.title.bright_white().bold()
    );
    println!(
        "  {} ID: {}",
        "→".style(info_style),
        template.id.to_string().yellow()
    );
    println!(
        "  {} {} {} every {} {}(s), first on {}",
        "→".style(info_style),
        template.kind(),
        money(template.amount),
        template.repeat_interval,
        template.repeat_unit,
        format_date(template.start_date, timezone)
    );
    println!(
        "\n{} Preview upcoming: tally recurring preview {}",
        "•".style(subtle_style),
        &template.id.to_string()[..8]
    );

    Ok(())
}

async fn list_recurring(repo: &SqliteRepository, timezone: Tz) -> Result<()> {
    let templates = repo.find_templates().await?;

    let mut rows = Vec::with_capacity(templates.len());
    for template in templates {
        let category_name = repo
            .find_category_by_id(template.category_id)
            .await?
            .map(|c| c.name)
            .unwrap_or_else(|| "Unknown".to_string());
        rows.push((template, category_name));
    }

    display_templates(&rows, timezone);
    Ok(())
}

async fn preview_recurring(
    repo: &SqliteRepository,
    config: &Config,
    calculator: &ScheduleCalculator,
    command: PreviewCommand,
) -> Result<()> {
    let id = resolve_template_id(repo, &command.id).await?;
    let template = repo
        .find_template_by_id(id)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("Recurring transaction {} not found", id)))?;

    let unit = RepeatUnit::resolve(&template.repeat_unit, config.engine.strict_repeat_units)?;
    let interval = u32::try_from(template.repeat_interval)?;
    let occurrences = calculator.preview(
        template.next_occurrence_date,
        interval,
        unit,
        template.end_date,
        command.count,
    );

    println!(
        "{} {} ({})",
        "↻".style(Style::new().blue()),
        template.title.bright_white().bold(),
        money(template.amount)
    );

    if occurrences.is_empty() {
        println!("  No upcoming occurrences.");
        return Ok(());
    }

    let now = Utc::now().timestamp();
    for occurrence in occurrences {
        let date = format_date(occurrence, calculator.timezone());
        if occurrence <= now {
            println!("  • {} {}", date, "(due)".yellow());
        } else {
            println!("  • {}", date);
        }
    }

    Ok(())
}
