use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use comfy_table::{Attribute, Cell, Color, Row, Table};
use rust_decimal::Decimal;
use tally_core::models::{Category, PeriodicTemplate, TransactionDetails};

/// Formats an amount with thousands separators: -1,234.56
pub fn money(amount: Decimal) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (int_part, dec_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut with_commas = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    let with_commas: String = with_commas.chars().rev().collect();

    if amount.is_sign_negative() && !amount.is_zero() {
        format!("-{with_commas}.{dec_part}")
    } else {
        format!("{with_commas}.{dec_part}")
    }
}

pub fn format_date(timestamp: i64, timezone: Tz) -> String {
    DateTime::<Utc>::from_timestamp(timestamp, 0)
        .map(|dt| dt.with_timezone(&timezone).format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

fn amount_cell(amount: Decimal) -> Cell {
    let cell = Cell::new(money(amount));
    if amount.is_sign_negative() {
        cell.fg(Color::Red)
    } else {
        cell.fg(Color::Green)
    }
}

fn tags_cell(tags: &[String]) -> Cell {
    Cell::new(if tags.is_empty() {
        "None".to_string()
    } else {
        tags.join(", ")
    })
}

pub fn display_categories(categories: &[Category]) {
    if categories.is_empty() {
        println!("No categories found.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name"]);

    for category in categories {
        let mut row = Row::new();
        row.add_cell(Cell::new(&category.id.to_string()[..8]));
        row.add_cell(Cell::new(&category.name));
        table.add_row(row);
    }

    println!("{table}");
}

pub fn display_templates(templates: &[(PeriodicTemplate, String)], timezone: Tz) {
    if templates.is_empty() {
        println!("No recurring transactions found.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Title", "Amount", "Every", "Next", "Ends", "Category"]);

    for (template, category_name) in templates {
        let mut row = Row::new();
        row.add_cell(Cell::new(&template.id.to_string()[..8]));

        let mut title_cell = Cell::new(&template.title);
        if template.is_exhausted() {
            title_cell = title_cell
                .add_attribute(Attribute::CrossedOut)
                .fg(Color::DarkGrey);
        }
        row.add_cell(title_cell);
        row.add_cell(amount_cell(template.amount));

        let unit = template.repeat_unit.trim_end_matches('s');
        row.add_cell(Cell::new(if template.repeat_interval == 1 {
            unit.to_string()
        } else {
            format!("{} {}s", template.repeat_interval, unit)
        }));

        let next_cell = if template.is_exhausted() {
            Cell::new("Finished").fg(Color::DarkGrey)
        } else if template.next_occurrence_date <= Utc::now().timestamp() {
            Cell::new(format_date(template.next_occurrence_date, timezone)).fg(Color::Yellow)
        } else {
            Cell::new(format_date(template.next_occurrence_date, timezone))
        };
        row.add_cell(next_cell);

        row.add_cell(Cell::new(
            template
                .end_date
                .map(|end| format_date(end, timezone))
                .unwrap_or_else(|| "Never".to_string()),
        ));
        row.add_cell(Cell::new(category_name));
        table.add_row(row);
    }

    println!("{table}");
}

pub fn display_transactions(transactions: &[TransactionDetails], timezone: Tz) {
    if transactions.is_empty() {
        println!("No transactions found.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Date", "Title", "Amount", "Category", "Tags"]);

    for details in transactions {
        let transaction = &details.transaction;
        let mut row = Row::new();
        row.add_cell(Cell::new(&transaction.id.to_string()[..8]));
        row.add_cell(Cell::new(format_date(transaction.transaction_date, timezone)));

        let mut title = String::new();
        if transaction.periodic_transaction_id.is_some() {
            title.push('↻');
            title.push(' ');
        }
        title.push_str(&transaction.title);
        row.add_cell(Cell::new(title));

        row.add_cell(amount_cell(transaction.amount));
        row.add_cell(Cell::new(&details.category_name));

        let tags: Vec<String> = details.tags.iter().map(|t| t.name.clone()).collect();
        row.add_cell(tags_cell(&tags));
        table.add_row(row);
    }

    println!("{table}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_money_formatting() {
        assert_eq!(money(Decimal::from_str("1234.56").unwrap()), "1,234.56");
        assert_eq!(money(Decimal::from_str("-43").unwrap()), "-43.00");
        assert_eq!(money(Decimal::ZERO), "0.00");
        assert_eq!(money(Decimal::from_str("1000000.99").unwrap()), "1,000,000.99");
    }

    #[test]
    fn test_format_date_uses_timezone() {
        // 2024-01-15 00:30 UTC is still the 14th in New York.
        let ts = 1_705_278_600;
        assert_eq!(format_date(ts, Tz::UTC), "2024-01-15");
        assert_eq!(format_date(ts, chrono_tz::America::New_York), "2024-01-14");
    }
}
