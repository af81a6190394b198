//! Template Service
//!
//! Template CRUD and creating tasks from templates.

use std::sync::Arc;

use crate::database::{is_unique_violation, DatabaseManager};
use crate::error::{AppError, AppResult};
use crate::logging::log_database_operation;
use crate::models::task::Task;
use crate::models::template::{
    CreateTemplate, InstantiateTemplate, TaskTemplate, TemplateError, UpdateTemplate,
};
use crate::services::task_service::TaskService;
use crate::services::time_provider::TimeProvider;

#[derive(Debug, Clone)]
pub struct TemplateService {
    db: DatabaseManager,
    tasks: TaskService,
    time: Arc<dyn TimeProvider>,
}

impl TemplateService {
    pub fn new(db: DatabaseManager, tasks: TaskService, time: Arc<dyn TimeProvider>) -> Self {
        Self { db, tasks, time }
    }

    pub async fn list(&self, user_id: &str) -> AppResult<Vec<TaskTemplate>> {
        Ok(sqlx::query_as::<_, TaskTemplate>(
            "SELECT * FROM task_templates WHERE user_id = ? ORDER BY name COLLATE NOCASE",
        )
        .bind(user_id)
        .fetch_all(&self.db.pool)
        .await?)
    }

    pub async fn get(&self, user_id: &str, id: &str) -> AppResult<TaskTemplate> {
        sqlx::query_as::<_, TaskTemplate>("SELECT * FROM task_templates WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.db.pool)
            .await?
            .ok_or_else(|| AppError::not_found("Template"))
    }

    async fn check_category(&self, template: &TaskTemplate) -> AppResult<()> {
        if let Some(category_id) = &template.category_id {
            let (count,): (i64,) =
                sqlx::query_as("SELECT COUNT(*) FROM categories WHERE id = ? AND user_id = ?")
                    .bind(category_id)
                    .bind(&template.user_id)
                    .fetch_one(&self.db.pool)
                    .await?;
            if count == 0 {
                return Err(TemplateError::InvalidCategory.into());
            }
        }
        Ok(())
    }

    pub async fn create(&self, user_id: &str, create: CreateTemplate) -> AppResult<TaskTemplate> {
        let template = create.into_template(user_id, self.time.now_utc())?;
        self.check_category(&template).await?;

        sqlx::query(
            r#"
            INSERT INTO task_templates (
                id, user_id, name, title, description, priority, category_id,
                estimated_minutes, recurrence, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&template.id)
        .bind(&template.user_id)
        .bind(&template.name)
        .bind(&template.title)
        .bind(&template.description)
        .bind(template.priority)
        .bind(&template.category_id)
        .bind(template.estimated_minutes)
        .bind(&template.recurrence)
        .bind(template.created_at)
        .bind(template.updated_at)
        .execute(&self.db.pool)
        .await
        .map_err(|e| duplicate_or(e, &template.name))?;

        log_database_operation("INSERT", "task_templates", Some(1));
        Ok(template)
    }

    pub async fn update(&self, user_id: &str, id: &str, update: UpdateTemplate) -> AppResult<TaskTemplate> {
        let mut template = self.get(user_id, id).await?;
        update.apply_to(&mut template, self.time.now_utc())?;
        self.check_category(&template).await?;

        sqlx::query(
            r#"
            UPDATE task_templates SET
                name = ?, title = ?, description = ?, priority = ?, category_id = ?,
                estimated_minutes = ?, recurrence = ?, updated_at = ?
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(&template.name)
        .bind(&template.title)
        .bind(&template.description)
        .bind(template.priority)
        .bind(&template.category_id)
        .bind(template.estimated_minutes)
        .bind(&template.recurrence)
        .bind(template.updated_at)
        .bind(&template.id)
        .bind(user_id)
        .execute(&self.db.pool)
        .await
        .map_err(|e| duplicate_or(e, &template.name))?;

        Ok(template)
    }

    pub async fn delete(&self, user_id: &str, id: &str) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM task_templates WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.db.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Template"));
        }
        log_database_operation("DELETE", "task_templates", Some(result.rows_affected()));
        Ok(())
    }

    /// Create a task from a template
    pub async fn instantiate(
        &self,
        user_id: &str,
        id: &str,
        overrides: InstantiateTemplate,
    ) -> AppResult<Task> {
        let template = self.get(user_id, id).await?;
        self.tasks.create(user_id, template.instantiate(overrides)).await
    }
}

fn duplicate_or(err: sqlx::Error, name: &str) -> AppError {
    if is_unique_violation(&err) {
        TemplateError::DuplicateName(name.to_string()).into()
    } else {
        err.into()
    }
}
