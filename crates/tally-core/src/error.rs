use thiserror::Error;

/// User-correctable problems with a new recurring template.
///
/// Returned in input order: the first failing rule wins.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Amount must be a number greater than zero")]
    InvalidAmount,

    #[error("A category is required")]
    MissingCategory,

    #[error("Repeat interval must be a whole number between 1 and 1000")]
    InvalidInterval,

    #[error("End date must be after the start date")]
    InvalidDateRange,
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Database error")]
    Database(#[from] sqlx::Error),

    #[error("Migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("IO error")]
    Io(#[from] std::io::Error),

    #[error("State file error")]
    Serialization(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Ambiguous ID: {0:?}")]
    AmbiguousId(Vec<(String, String)>),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Unknown repeat unit: {0}")]
    UnknownRepeatUnit(String),

    #[error("Corrupt record: {0}")]
    CorruptRecord(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),
}

impl CoreError {
    /// True for failures of the underlying persistence layers.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            CoreError::Database(_)
                | CoreError::Migration(_)
                | CoreError::Io(_)
                | CoreError::Serialization(_)
        )
    }
}
