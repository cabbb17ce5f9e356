use crate::error::CoreError;
use crate::models::{NewTemplateData, PeriodicTemplate, Tag, Transaction, TransactionDetails};
use crate::repository::tags::{find_or_create_tag, tags_for_template};
use crate::repository::transactions::{insert_transaction, load_details};
use crate::repository::{SqliteRepository, TemplateRepository};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use uuid::Uuid;

#[async_trait]
impl TemplateRepository for SqliteRepository {
    async fn insert_template(&self, data: NewTemplateData) -> Result<PeriodicTemplate, CoreError> {
        let mut tx = self.pool().begin().await?;

        let category_exists: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM categories WHERE id = $1")
                .bind(data.category_id)
                .fetch_optional(&mut *tx)
                .await?;
        if category_exists.is_none() {
            return Err(CoreError::NotFound(format!(
                "Category with id {} not found",
                data.category_id
            )));
        }

        let template = PeriodicTemplate {
            id: Uuid::now_v7(),
            amount: data.amount,
            title: data.title,
            category_id: data.category_id,
            notes: data.notes,
            repeat_interval: data.repeat_interval,
            repeat_unit: data.repeat_unit.to_string(),
            start_date: data.start_date,
            next_occurrence_date: data.start_date,
            end_date: data.end_date,
            created_at: Utc::now().timestamp(),
        };

        sqlx::query(
            r#"INSERT INTO periodic_transactions (id, amount, title, category_id, notes, repeat_interval, repeat_unit, start_date, next_occurrence_date, end_date, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)"#,
        )
        .bind(template.id)
        .bind(template.amount.to_string())
        .bind(&template.title)
        .bind(template.category_id)
        .bind(&template.notes)
        .bind(template.repeat_interval)
        .bind(&template.repeat_unit)
        .bind(template.start_date)
        .bind(template.next_occurrence_date)
        .bind(template.end_date)
        .bind(template.created_at)
        .execute(&mut *tx)
        .await?;

        let mut seen = HashSet::new();
        for name in data.tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
            if !seen.insert(name) {
                continue;
            }
            let resolution = find_or_create_tag(&mut tx, name).await?;
            sqlx::query(
                "INSERT INTO periodic_transaction_tags (periodic_transaction_id, tag_id) VALUES ($1, $2)",
            )
            .bind(template.id)
            .bind(resolution.tag.id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        tracing::info!(template_id = %template.id, title = %template.title, "created recurring template");
        Ok(template)
    }

    async fn find_template_by_id(&self, id: Uuid) -> Result<Option<PeriodicTemplate>, CoreError> {
        let template = sqlx::query_as("SELECT * FROM periodic_transactions WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(template)
    }

    async fn find_templates(&self) -> Result<Vec<PeriodicTemplate>, CoreError> {
        let templates = sqlx::query_as(
            "SELECT * FROM periodic_transactions ORDER BY next_occurrence_date, id",
        )
        .fetch_all(self.pool())
        .await?;
        Ok(templates)
    }

    async fn find_templates_by_short_id_prefix(
        &self,
        short_id: &str,
    ) -> Result<Vec<PeriodicTemplate>, CoreError> {
        // Ids are stored as blobs, so the prefix match happens on the text form.
        let prefix = short_id.to_lowercase();
        let templates = self.find_templates().await?;
        Ok(templates
            .into_iter()
            .filter(|t| t.id.to_string().starts_with(&prefix))
            .collect())
    }
}

#[async_trait]
impl super::PeriodicTemplateStore for SqliteRepository {
    async fn find_due(&self, now: i64) -> Result<Vec<PeriodicTemplate>, CoreError> {
        let templates = sqlx::query_as(
            r#"SELECT * FROM periodic_transactions
            WHERE next_occurrence_date <= $1
            ORDER BY next_occurrence_date, id"#,
        )
        .bind(now)
        .fetch_all(self.pool())
        .await?;
        Ok(templates)
    }

    async fn advance_cursor(&self, id: Uuid, new_cursor: i64) -> Result<(), CoreError> {
        let result = sqlx::query(
            r#"UPDATE periodic_transactions SET next_occurrence_date = $1
            WHERE id = $2 AND next_occurrence_date <= $3"#,
        )
        .bind(new_cursor)
        .bind(id)
        .bind(new_cursor)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return match self.find_template_by_id(id).await? {
                Some(current) => Err(CoreError::InvalidInput(format!(
                    "Cursor of template {} cannot move back from {} to {}",
                    id, current.next_occurrence_date, new_cursor
                ))),
                None => Err(CoreError::NotFound(format!(
                    "Template with id {} not found",
                    id
                ))),
            };
        }

        Ok(())
    }

    async fn get_tags_for(&self, template_id: Uuid) -> Result<Vec<Tag>, CoreError> {
        let mut conn = self.pool().acquire().await?;
        tags_for_template(&mut conn, template_id).await
    }

    async fn insert_occurrence(
        &self,
        transaction: &Transaction,
        tags: &[Tag],
    ) -> Result<Option<TransactionDetails>, CoreError> {
        let mut tx = self.pool().begin().await?;

        if !insert_transaction(&mut tx, transaction, tags).await? {
            tx.rollback().await?;
            return Ok(None);
        }

        let details = load_details(&mut tx, transaction.clone()).await?;
        tx.commit().await?;
        Ok(Some(details))
    }
}
