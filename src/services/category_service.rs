//! Category Service

use std::sync::Arc;

use crate::database::{is_unique_violation, DatabaseManager};
use crate::error::{AppError, AppResult};
use crate::logging::log_database_operation;
use crate::models::category::{Category, CategoryError, CreateCategory, UpdateCategory};
use crate::services::time_provider::TimeProvider;

#[derive(Debug, Clone)]
pub struct CategoryService {
    db: DatabaseManager,
    time: Arc<dyn TimeProvider>,
}

impl CategoryService {
    pub fn new(db: DatabaseManager, time: Arc<dyn TimeProvider>) -> Self {
        Self { db, time }
    }

    pub async fn list(&self, user_id: &str) -> AppResult<Vec<Category>> {
        Ok(sqlx::query_as::<_, Category>(
            "SELECT * FROM categories WHERE user_id = ? ORDER BY name COLLATE NOCASE",
        )
        .bind(user_id)
        .fetch_all(&self.db.pool)
        .await?)
    }

    pub async fn get(&self, user_id: &str, id: &str) -> AppResult<Category> {
        sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.db.pool)
            .await?
            .ok_or_else(|| AppError::not_found("Category"))
    }

    pub async fn create(&self, user_id: &str, create: CreateCategory) -> AppResult<Category> {
        let (name, color) = create.normalized()?;
        let category = Category::new(user_id, name, color, self.time.now_utc());

        sqlx::query(
            "INSERT INTO categories (id, user_id, name, color, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&category.id)
        .bind(&category.user_id)
        .bind(&category.name)
        .bind(&category.color)
        .bind(category.created_at)
        .bind(category.updated_at)
        .execute(&self.db.pool)
        .await
        .map_err(|e| duplicate_or(e, &category.name))?;

        log_database_operation("INSERT", "categories", Some(1));
        Ok(category)
    }

    pub async fn update(&self, user_id: &str, id: &str, update: UpdateCategory) -> AppResult<Category> {
        let mut category = self.get(user_id, id).await?;
        update.apply_to(&mut category)?;
        category.updated_at = self.time.now_utc();

        sqlx::query("UPDATE categories SET name = ?, color = ?, updated_at = ? WHERE id = ? AND user_id = ?")
            .bind(&category.name)
            .bind(&category.color)
            .bind(category.updated_at)
            .bind(&category.id)
            .bind(user_id)
            .execute(&self.db.pool)
            .await
            .map_err(|e| duplicate_or(e, &category.name))?;

        Ok(category)
    }

    /// Delete a category. Its tasks and templates lose the reference.
    pub async fn delete(&self, user_id: &str, id: &str) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM categories WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.db.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Category"));
        }
        log_database_operation("DELETE", "categories", Some(result.rows_affected()));
        Ok(())
    }
}

fn duplicate_or(err: sqlx::Error, name: &str) -> AppError {
    if is_unique_violation(&err) {
        CategoryError::DuplicateName(name.to_string()).into()
    } else {
        err.into()
    }
}
