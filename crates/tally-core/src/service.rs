//! Creation of recurring templates from raw user input.

use crate::error::{CoreError, ValidationError};
use crate::models::{NewTemplateData, NewTemplateInput, PeriodicTemplate};
use crate::repository::TemplateRepository;
use rust_decimal::Decimal;
use std::str::FromStr;

pub const MIN_REPEAT_INTERVAL: i64 = 1;
pub const MAX_REPEAT_INTERVAL: i64 = 1000;

/// Parses a user-typed amount, tolerating currency symbols, spaces and both
/// decimal conventions.
///
/// Everything except digits, `.` and `,` is dropped. When both separators
/// occur, the last one is the decimal separator and the other groups
/// thousands. A separator that occurs more than once is a thousands
/// separator. A single separator is always decimal.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();

    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let last_dot = cleaned.rfind('.');
    let last_comma = cleaned.rfind(',');
    let decimal_separator = match (last_dot, last_comma) {
        (Some(dot), Some(comma)) => Some(if dot > comma { '.' } else { ',' }),
        (Some(_), None) if cleaned.matches('.').count() == 1 => Some('.'),
        (None, Some(_)) if cleaned.matches(',').count() == 1 => Some(','),
        _ => None,
    };

    let normalized: String = cleaned
        .chars()
        .filter_map(|c| match c {
            '.' | ',' if Some(c) == decimal_separator => Some('.'),
            '.' | ',' => None,
            digit => Some(digit),
        })
        .collect();

    Decimal::from_str(&normalized).ok()
}

/// Checks raw input in order and stops at the first problem.
pub fn validate_template(input: NewTemplateInput) -> Result<NewTemplateData, ValidationError> {
    let magnitude = parse_amount(&input.amount)
        .filter(|amount| *amount > Decimal::ZERO)
        .ok_or(ValidationError::InvalidAmount)?;

    let category_id = input.category_id.ok_or(ValidationError::MissingCategory)?;

    if !(MIN_REPEAT_INTERVAL..=MAX_REPEAT_INTERVAL).contains(&input.repeat_interval) {
        return Err(ValidationError::InvalidInterval);
    }

    if let Some(end_date) = input.end_date {
        if end_date <= input.start_date {
            return Err(ValidationError::InvalidDateRange);
        }
    }

    Ok(NewTemplateData {
        title: input.title.trim().to_string(),
        amount: input.kind.signed(magnitude),
        category_id,
        notes: input.notes.filter(|n| !n.trim().is_empty()),
        repeat_interval: input.repeat_interval,
        repeat_unit: input.repeat_unit,
        start_date: input.start_date,
        end_date: input.end_date,
        tags: input.tags,
    })
}

/// Validates `input` and stores it as a new template whose cursor starts at
/// its start date.
///
/// Validation failures come back as `CoreError::Validation`; tag creation and
/// the template insert commit together or not at all.
pub async fn create_template(
    repo: &impl TemplateRepository,
    input: NewTemplateInput,
) -> Result<PeriodicTemplate, CoreError> {
    let data = validate_template(input).map_err(|e| {
        tracing::debug!(error = %e, "rejected recurring template");
        e
    })?;
    repo.insert_template(data).await
}
