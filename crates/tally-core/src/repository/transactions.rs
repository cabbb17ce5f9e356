use crate::error::CoreError;
use crate::models::{Tag, Transaction, TransactionDetails};
use crate::repository::tags::tags_for_transaction;
use crate::repository::SqliteRepository;
use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use uuid::Uuid;

/// Inserts a transaction row and links `tags` to it.
///
/// Returns `false` without writing anything when a transaction from the same
/// template already exists at the same date.
pub(crate) async fn insert_transaction(
    conn: &mut SqliteConnection,
    transaction: &Transaction,
    tags: &[Tag],
) -> Result<bool, CoreError> {
    let result = sqlx::query(
        r#"INSERT INTO transactions (id, amount, title, transaction_date, notes, location, category_id, periodic_transaction_id, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT DO NOTHING"#,
    )
    .bind(transaction.id)
    .bind(transaction.amount.to_string())
    .bind(&transaction.title)
    .bind(transaction.transaction_date)
    .bind(&transaction.notes)
    .bind(&transaction.location)
    .bind(transaction.category_id)
    .bind(transaction.periodic_transaction_id)
    .bind(transaction.created_at)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(false);
    }

    if !tags.is_empty() {
        let mut query_builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("INSERT INTO transaction_tags (transaction_id, tag_id) ");
        query_builder.push_values(tags.iter(), |mut b, tag| {
            b.push_bind(transaction.id).push_bind(tag.id);
        });
        query_builder.build().execute(&mut *conn).await?;
    }

    Ok(true)
}

/// Resolves the category name and tags of a stored transaction.
pub(crate) async fn load_details(
    conn: &mut SqliteConnection,
    transaction: Transaction,
) -> Result<TransactionDetails, CoreError> {
    let category_name: String = sqlx::query_scalar("SELECT name FROM categories WHERE id = $1")
        .bind(transaction.category_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| {
            CoreError::NotFound(format!("Category with id {} not found", transaction.category_id))
        })?;

    let tags = tags_for_transaction(conn, transaction.id).await?;

    Ok(TransactionDetails {
        transaction,
        category_name,
        tags,
    })
}

async fn load_all_details(
    conn: &mut SqliteConnection,
    transactions: Vec<Transaction>,
) -> Result<Vec<TransactionDetails>, CoreError> {
    let mut details = Vec::with_capacity(transactions.len());
    for transaction in transactions {
        details.push(load_details(&mut *conn, transaction).await?);
    }
    Ok(details)
}

#[async_trait]
impl super::TransactionRepository for SqliteRepository {
    async fn find_transactions(&self) -> Result<Vec<TransactionDetails>, CoreError> {
        let mut conn = self.pool().acquire().await?;
        let transactions: Vec<Transaction> =
            sqlx::query_as("SELECT * FROM transactions ORDER BY transaction_date DESC, id DESC")
                .fetch_all(&mut *conn)
                .await?;
        load_all_details(&mut conn, transactions).await
    }

    async fn find_transactions_for_template(
        &self,
        template_id: Uuid,
    ) -> Result<Vec<TransactionDetails>, CoreError> {
        let mut conn = self.pool().acquire().await?;
        let transactions: Vec<Transaction> = sqlx::query_as(
            r#"SELECT * FROM transactions
            WHERE periodic_transaction_id = $1
            ORDER BY transaction_date"#,
        )
        .bind(template_id)
        .fetch_all(&mut *conn)
        .await?;
        load_all_details(&mut conn, transactions).await
    }

    async fn find_transaction_details(
        &self,
        id: Uuid,
    ) -> Result<Option<TransactionDetails>, CoreError> {
        let mut conn = self.pool().acquire().await?;
        let transaction: Option<Transaction> =
            sqlx::query_as("SELECT * FROM transactions WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?;

        match transaction {
            Some(t) => Ok(Some(load_details(&mut conn, t).await?)),
            None => Ok(None),
        }
    }
}
