//! Project Service

use std::sync::Arc;

use serde::Deserialize;

use crate::database::DatabaseManager;
use crate::error::{AppError, AppResult};
use crate::logging::log_database_operation;
use crate::models::project::{CreateProject, Project, UpdateProject};
use crate::services::time_provider::TimeProvider;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectListQuery {
    #[serde(default)]
    pub include_archived: bool,
}

#[derive(Debug, Clone)]
pub struct ProjectService {
    db: DatabaseManager,
    time: Arc<dyn TimeProvider>,
}

impl ProjectService {
    pub fn new(db: DatabaseManager, time: Arc<dyn TimeProvider>) -> Self {
        Self { db, time }
    }

    /// Projects ordered by name, archived ones only on request
    pub async fn list(&self, user_id: &str, include_archived: bool) -> AppResult<Vec<Project>> {
        Ok(sqlx::query_as::<_, Project>(
            "SELECT * FROM projects WHERE user_id = ? AND (? OR archived = FALSE) \
             ORDER BY name COLLATE NOCASE",
        )
        .bind(user_id)
        .bind(include_archived)
        .fetch_all(&self.db.pool)
        .await?)
    }

    pub async fn get(&self, user_id: &str, id: &str) -> AppResult<Project> {
        sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.db.pool)
            .await?
            .ok_or_else(|| AppError::not_found("Project"))
    }

    pub async fn create(&self, user_id: &str, create: CreateProject) -> AppResult<Project> {
        let project = create.into_project(user_id, self.time.now_utc())?;

        sqlx::query(
            "INSERT INTO projects (id, user_id, name, description, color, archived, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&project.id)
        .bind(&project.user_id)
        .bind(&project.name)
        .bind(&project.description)
        .bind(&project.color)
        .bind(project.archived)
        .bind(project.created_at)
        .bind(project.updated_at)
        .execute(&self.db.pool)
        .await?;

        log_database_operation("INSERT", "projects", Some(1));
        Ok(project)
    }

    pub async fn update(&self, user_id: &str, id: &str, update: UpdateProject) -> AppResult<Project> {
        let mut project = self.get(user_id, id).await?;
        update.apply_to(&mut project)?;
        project.updated_at = self.time.now_utc();

        sqlx::query(
            "UPDATE projects SET name = ?, description = ?, color = ?, archived = ?, updated_at = ? \
             WHERE id = ? AND user_id = ?",
        )
        .bind(&project.name)
        .bind(&project.description)
        .bind(&project.color)
        .bind(project.archived)
        .bind(project.updated_at)
        .bind(&project.id)
        .bind(user_id)
        .execute(&self.db.pool)
        .await?;

        Ok(project)
    }

    /// Delete a project. Its tasks are kept without a project.
    pub async fn delete(&self, user_id: &str, id: &str) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM projects WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.db.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Project"));
        }
        log_database_operation("DELETE", "projects", Some(result.rows_affected()));
        Ok(())
    }
}
