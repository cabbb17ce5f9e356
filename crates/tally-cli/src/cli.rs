use clap::{Parser, Subcommand};
use tally_core::models::{RepeatUnit, TransactionKind};

/// Recurring income and expenses for your personal ledger
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Manage categories
    Category(CategoryCommand),
    /// Manage recurring transactions
    Recurring(RecurringCommand),
    /// Add every recurring transaction that has fallen due
    Sync(SyncCommand),
    /// List transactions
    List(ListCommand),
}

#[derive(Parser, Debug, Clone)]
pub struct CategoryCommand {
    #[command(subcommand)]
    pub action: CategoryAction,
}

#[derive(Subcommand, Debug, Clone)]
pub enum CategoryAction {
    /// Add a new category
    Add {
        /// The name of the category
        name: String,
    },
    /// List all categories
    List,
}

#[derive(Parser, Debug, Clone)]
pub struct RecurringCommand {
    #[command(subcommand)]
    pub action: RecurringAction,
}

#[derive(Subcommand, Debug, Clone)]
pub enum RecurringAction {
    /// Add a new recurring transaction
    Add(RecurringAddCommand),
    /// List recurring transactions
    List,
    /// Show the upcoming occurrences of a recurring transaction
    Preview(PreviewCommand),
}

#[derive(Parser, Debug, Clone)]
pub struct RecurringAddCommand {
    /// Title copied onto every generated transaction
    #[arg(long)]
    pub title: String,
    /// Amount, e.g. "43.00", "1.250,00" or "$1,250.00"
    #[arg(long, allow_hyphen_values = true)]
    pub amount: String,
    /// Whether the amount is spent or received (expenditure|deposit)
    #[arg(long, default_value = "expenditure")]
    pub kind: TransactionKind,
    /// Name of an existing category
    #[arg(long)]
    pub category: String,
    /// Repeat every N units
    #[arg(long, default_value_t = 1, allow_hyphen_values = true)]
    pub every: i64,
    /// Repeat unit (day|week|month|year)
    #[arg(long, default_value = "month")]
    pub unit: RepeatUnit,
    /// First occurrence (e.g. "2024-01-15", "today", "next friday")
    #[arg(long)]
    pub start: Option<String>,
    /// Last possible occurrence
    #[arg(long)]
    pub end: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
    /// Tags to add to each generated transaction
    #[arg(short, long)]
    pub tag: Vec<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct PreviewCommand {
    /// ID or unique ID prefix of the recurring transaction
    pub id: String,
    /// Number of occurrences to show
    #[arg(short, long, default_value_t = 5)]
    pub count: usize,
}

#[derive(Parser, Debug, Clone)]
pub struct SyncCommand {
    /// Run even if the last sync was recent
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct ListCommand {
    /// Only transactions generated by this recurring transaction (ID prefix)
    #[arg(long)]
    pub template: Option<String>,
}
