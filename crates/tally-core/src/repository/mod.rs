use crate::db::DbPool;
use crate::error::CoreError;
use crate::models::{
    Category, NewTemplateData, PeriodicTemplate, Tag, Transaction, TransactionDetails,
};
use async_trait::async_trait;
use uuid::Uuid;

// Domain modules; each implements its trait for `SqliteRepository`.
//
// Query helpers inside them take `&mut SqliteConnection`, so callers can run
// them on a pooled connection or inside an open transaction alike.
pub mod categories;
pub mod tags;
pub mod templates;
pub mod transactions;

/// The store the materialization engine runs against.
#[async_trait]
pub trait PeriodicTemplateStore: Send + Sync {
    /// All templates whose cursor is at or before `now`, oldest cursor first.
    async fn find_due(&self, now: i64) -> Result<Vec<PeriodicTemplate>, CoreError>;
    /// Moves a template's cursor forward. Moving it backwards is rejected.
    async fn advance_cursor(&self, id: Uuid, new_cursor: i64) -> Result<(), CoreError>;
    async fn get_tags_for(&self, template_id: Uuid) -> Result<Vec<Tag>, CoreError>;
    /// Writes one occurrence and its tag links atomically.
    ///
    /// Returns `None` when the template already has a transaction at that date.
    async fn insert_occurrence(
        &self,
        transaction: &Transaction,
        tags: &[Tag],
    ) -> Result<Option<TransactionDetails>, CoreError>;
}

/// Domain-specific trait for template management
#[async_trait]
pub trait TemplateRepository {
    /// Inserts a template, resolving its tags, in one transaction.
    ///
    /// Tag names are trimmed; blank and repeated names are skipped.
    async fn insert_template(&self, data: NewTemplateData) -> Result<PeriodicTemplate, CoreError>;
    async fn find_template_by_id(&self, id: Uuid) -> Result<Option<PeriodicTemplate>, CoreError>;
    async fn find_templates(&self) -> Result<Vec<PeriodicTemplate>, CoreError>;
    async fn find_templates_by_short_id_prefix(
        &self,
        short_id: &str,
    ) -> Result<Vec<PeriodicTemplate>, CoreError>;
}

/// Domain-specific trait for category operations
#[async_trait]
pub trait CategoryRepository {
    async fn add_category(&self, name: String) -> Result<Category, CoreError>;
    async fn find_category_by_id(&self, id: Uuid) -> Result<Option<Category>, CoreError>;
    async fn find_category_by_name(&self, name: &str) -> Result<Option<Category>, CoreError>;
    async fn find_categories(&self) -> Result<Vec<Category>, CoreError>;
}

/// Domain-specific trait for reading the ledger
#[async_trait]
pub trait TransactionRepository {
    /// Every transaction, newest first.
    async fn find_transactions(&self) -> Result<Vec<TransactionDetails>, CoreError>;
    /// Transactions generated by one template, oldest first.
    async fn find_transactions_for_template(
        &self,
        template_id: Uuid,
    ) -> Result<Vec<TransactionDetails>, CoreError>;
    async fn find_transaction_details(
        &self,
        id: Uuid,
    ) -> Result<Option<TransactionDetails>, CoreError>;
}

/// Main repository trait that composes all domain traits
pub trait Repository:
    PeriodicTemplateStore + TemplateRepository + CategoryRepository + TransactionRepository
{
}

/// SQLite implementation of the repository pattern
#[derive(Debug, Clone)]
pub struct SqliteRepository {
    pool: DbPool,
}

impl SqliteRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the database pool for internal use across modules
    pub(crate) fn pool(&self) -> &DbPool {
        &self.pool
    }
}

impl Repository for SqliteRepository {}
