use crate::error::CoreError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, FromRow)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub color: String,
}

/// Outcome of a find-or-create tag lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagResolution {
    pub tag: Tag,
    /// Whether the tag row was inserted by this lookup
    pub created: bool,
}

// ============================================================================
// Recurrence primitives
// ============================================================================

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RepeatUnit {
    Day,
    Week,
    #[default]
    Month,
    Year,
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid repeat unit: {0}")]
pub struct ParseRepeatUnitError(String);

impl RepeatUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepeatUnit::Day => "day",
            RepeatUnit::Week => "week",
            RepeatUnit::Month => "month",
            RepeatUnit::Year => "year",
        }
    }

    /// Decodes a stored unit.
    ///
    /// Unrecognised values fall back to `Month` with a warning unless `strict`
    /// is set, in which case they are reported as `CoreError::UnknownRepeatUnit`.
    pub fn resolve(raw: &str, strict: bool) -> Result<Self, CoreError> {
        match raw.parse::<RepeatUnit>() {
            Ok(unit) => Ok(unit),
            Err(_) if strict => Err(CoreError::UnknownRepeatUnit(raw.to_string())),
            Err(_) => {
                tracing::warn!(unit = raw, "unknown repeat unit, treating as month");
                Ok(RepeatUnit::Month)
            }
        }
    }
}

impl std::fmt::Display for RepeatUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RepeatUnit {
    type Err = ParseRepeatUnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" | "days" => Ok(RepeatUnit::Day),
            "week" | "weeks" => Ok(RepeatUnit::Week),
            "month" | "months" => Ok(RepeatUnit::Month),
            "year" | "years" => Ok(RepeatUnit::Year),
            _ => Err(ParseRepeatUnitError(s.to_string())),
        }
    }
}

/// Direction of money flow, used only to sign amounts at creation time.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    #[default]
    Expenditure,
    Deposit,
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid transaction kind: {0}")]
pub struct ParseTransactionKindError(String);

impl TransactionKind {
    /// Applies this kind's sign to a positive magnitude.
    pub fn signed(&self, magnitude: Decimal) -> Decimal {
        match self {
            TransactionKind::Expenditure => -magnitude.abs(),
            TransactionKind::Deposit => magnitude.abs(),
        }
    }
}

impl FromStr for TransactionKind {
    type Err = ParseTransactionKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "expenditure" | "expense" | "withdrawal" => Ok(TransactionKind::Expenditure),
            "deposit" | "income" => Ok(TransactionKind::Deposit),
            _ => Err(ParseTransactionKindError(s.to_string())),
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionKind::Expenditure => write!(f, "expenditure"),
            TransactionKind::Deposit => write!(f, "deposit"),
        }
    }
}

// ============================================================================
// Periodic templates and their materialized transactions
// ============================================================================

/// A recurring transaction definition.
///
/// `next_occurrence_date` is the cursor: every occurrence strictly before it
/// has been materialized. All timestamps are seconds since the Unix epoch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PeriodicTemplate {
    pub id: Uuid,
    /// Signed; negative for expenditure
    pub amount: Decimal,
    pub title: String,
    pub category_id: Uuid,
    pub notes: Option<String>,
    pub repeat_interval: i64,
    /// Stored unit text, decoded with [`RepeatUnit::resolve`] when scheduling
    pub repeat_unit: String,
    pub start_date: i64,
    pub next_occurrence_date: i64,
    pub end_date: Option<i64>,
    pub created_at: i64,
}

impl PeriodicTemplate {
    /// True once the cursor has moved beyond the end date.
    pub fn is_exhausted(&self) -> bool {
        self.end_date
            .is_some_and(|end| self.next_occurrence_date > end)
    }

    pub fn kind(&self) -> TransactionKind {
        if self.amount.is_sign_negative() {
            TransactionKind::Expenditure
        } else {
            TransactionKind::Deposit
        }
    }
}

impl<'r> FromRow<'r, SqliteRow> for PeriodicTemplate {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let amount: String = row.try_get("amount")?;
        Ok(Self {
            id: row.try_get("id")?,
            amount: decode_amount(&amount)?,
            title: row.try_get("title")?,
            category_id: row.try_get("category_id")?,
            notes: row.try_get("notes")?,
            repeat_interval: row.try_get("repeat_interval")?,
            repeat_unit: row.try_get("repeat_unit")?,
            start_date: row.try_get("start_date")?,
            next_occurrence_date: row.try_get("next_occurrence_date")?,
            end_date: row.try_get("end_date")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// A concrete ledger entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id: Uuid,
    pub amount: Decimal,
    pub title: String,
    pub transaction_date: i64,
    pub notes: Option<String>,
    pub location: Option<String>,
    pub category_id: Uuid,
    /// Template that generated this row; `None` for manual entries
    pub periodic_transaction_id: Option<Uuid>,
    pub created_at: i64,
}

impl<'r> FromRow<'r, SqliteRow> for Transaction {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let amount: String = row.try_get("amount")?;
        Ok(Self {
            id: row.try_get("id")?,
            amount: decode_amount(&amount)?,
            title: row.try_get("title")?,
            transaction_date: row.try_get("transaction_date")?,
            notes: row.try_get("notes")?,
            location: row.try_get("location")?,
            category_id: row.try_get("category_id")?,
            periodic_transaction_id: row.try_get("periodic_transaction_id")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

fn decode_amount(raw: &str) -> Result<Decimal, sqlx::Error> {
    Decimal::from_str(raw).map_err(|e| sqlx::Error::ColumnDecode {
        index: "amount".to_string(),
        source: Box::new(e),
    })
}

/// A transaction with its category name and tags resolved for display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionDetails {
    pub transaction: Transaction,
    pub category_name: String,
    pub tags: Vec<Tag>,
}

// ============================================================================
// Data Transfer Objects
// ============================================================================

/// Raw user input for a new recurring template.
#[derive(Debug, Clone, Default)]
pub struct NewTemplateInput {
    pub title: String,
    /// Unsigned amount as typed, e.g. "1.234,50" or "$43.00"
    pub amount: String,
    pub kind: TransactionKind,
    pub category_id: Option<Uuid>,
    pub notes: Option<String>,
    pub repeat_interval: i64,
    pub repeat_unit: RepeatUnit,
    pub start_date: i64,
    pub end_date: Option<i64>,
    /// Tag names; resolved or created on insert
    pub tags: Vec<String>,
}

/// A validated template ready to insert. `amount` already carries its sign.
#[derive(Debug, Clone)]
pub struct NewTemplateData {
    pub title: String,
    pub amount: Decimal,
    pub category_id: Uuid,
    pub notes: Option<String>,
    pub repeat_interval: i64,
    pub repeat_unit: RepeatUnit,
    pub start_date: i64,
    pub end_date: Option<i64>,
    pub tags: Vec<String>,
}

/// Configuration for the materialization engine and its throttle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Hard cap on occurrences materialized per template in one scan
    pub max_iterations_per_template: u32,
    /// Minimum seconds between two catch-up scans
    pub throttle_interval_secs: i64,
    /// IANA timezone for calendar arithmetic
    pub timezone: String,
    /// Report unknown repeat units as errors instead of treating them as months
    pub strict_repeat_units: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_iterations_per_template: 1000,
            throttle_interval_secs: 6 * 60 * 60,
            timezone: "UTC".to_string(),
            strict_repeat_units: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeat_unit_parsing() {
        assert_eq!("day".parse::<RepeatUnit>(), Ok(RepeatUnit::Day));
        assert_eq!("Weeks".parse::<RepeatUnit>(), Ok(RepeatUnit::Week));
        assert_eq!(" month ".parse::<RepeatUnit>(), Ok(RepeatUnit::Month));
        assert!("fortnight".parse::<RepeatUnit>().is_err());
    }

    #[test]
    fn test_repeat_unit_resolve_lenient_falls_back_to_month() {
        assert_eq!(RepeatUnit::resolve("quarter", false).unwrap(), RepeatUnit::Month);
        assert_eq!(RepeatUnit::resolve("year", false).unwrap(), RepeatUnit::Year);
    }

    #[test]
    fn test_repeat_unit_resolve_strict_rejects_unknown() {
        let result = RepeatUnit::resolve("quarter", true);
        assert!(matches!(result, Err(CoreError::UnknownRepeatUnit(u)) if u == "quarter"));
    }

    #[test]
    fn test_transaction_kind_sign() {
        let magnitude = Decimal::new(4300, 2);
        assert_eq!(TransactionKind::Expenditure.signed(magnitude), Decimal::new(-4300, 2));
        assert_eq!(TransactionKind::Deposit.signed(magnitude), magnitude);
        assert_eq!("income".parse::<TransactionKind>(), Ok(TransactionKind::Deposit));
    }

    #[test]
    fn test_template_exhaustion() {
        let template = PeriodicTemplate {
            id: Uuid::now_v7(),
            amount: Decimal::new(-100, 0),
            title: "Rent".to_string(),
            category_id: Uuid::now_v7(),
            notes: None,
            repeat_interval: 1,
            repeat_unit: "month".to_string(),
            start_date: 0,
            next_occurrence_date: 200,
            end_date: Some(100),
            created_at: 0,
        };
        assert!(template.is_exhausted());
        assert_eq!(template.kind(), TransactionKind::Expenditure);

        let open_ended = PeriodicTemplate { end_date: None, ..template };
        assert!(!open_ended.is_exhausted());
    }

    #[test]
    fn test_engine_config_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_iterations_per_template, 1000);
        assert_eq!(config.throttle_interval_secs, 21_600);
        assert_eq!(config.timezone, "UTC");
        assert!(!config.strict_repeat_units);
    }
}
