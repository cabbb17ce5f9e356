use crate::error::CoreError;
use crate::models::Category;
use crate::repository::SqliteRepository;
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

#[async_trait]
impl super::CategoryRepository for SqliteRepository {
    async fn add_category(&self, name: String) -> Result<Category, CoreError> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(CoreError::InvalidInput(
                "Category name cannot be empty".to_string(),
            ));
        }

        let mut tx = self.pool().begin().await?;

        let existing: Option<Category> = sqlx::query_as("SELECT * FROM categories WHERE name = $1")
            .bind(&name)
            .fetch_optional(&mut *tx)
            .await?;
        if existing.is_some() {
            return Err(CoreError::InvalidInput(format!(
                "Category '{}' already exists",
                name
            )));
        }

        let category = Category {
            id: Uuid::now_v7(),
            name,
            created_at: Utc::now().timestamp(),
        };

        sqlx::query("INSERT INTO categories (id, name, created_at) VALUES ($1, $2, $3)")
            .bind(category.id)
            .bind(&category.name)
            .bind(category.created_at)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(category)
    }

    async fn find_category_by_id(&self, id: Uuid) -> Result<Option<Category>, CoreError> {
        let category = sqlx::query_as("SELECT * FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(category)
    }

    async fn find_category_by_name(&self, name: &str) -> Result<Option<Category>, CoreError> {
        let category = sqlx::query_as("SELECT * FROM categories WHERE name = $1")
            .bind(name)
            .fetch_optional(self.pool())
            .await?;
        Ok(category)
    }

    async fn find_categories(&self) -> Result<Vec<Category>, CoreError> {
        let categories = sqlx::query_as("SELECT * FROM categories ORDER BY name")
            .fetch_all(self.pool())
            .await?;
        Ok(categories)
    }
}
