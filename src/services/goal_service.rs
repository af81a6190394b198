//! Goal Service
//!
//! Goal CRUD. Every goal is returned with the progress of its linked tasks.

use std::sync::Arc;

use sqlx::FromRow;

use crate::database::DatabaseManager;
use crate::error::{AppError, AppResult};
use crate::logging::log_database_operation;
use crate::models::goal::{CreateGoal, Goal, GoalWithProgress, UpdateGoal};
use crate::services::time_provider::TimeProvider;

const SELECT_WITH_PROGRESS: &str = r#"
    SELECT g.*,
           COUNT(t.id) AS task_count,
           COALESCE(SUM(CASE WHEN t.status = 'done' THEN 1 ELSE 0 END), 0) AS completed_task_count
    FROM goals g
    LEFT JOIN tasks t ON t.goal_id = g.id
"#;

#[derive(Debug, FromRow)]
struct GoalProgressRow {
    #[sqlx(flatten)]
    goal: Goal,
    task_count: i64,
    completed_task_count: i64,
}

impl From<GoalProgressRow> for GoalWithProgress {
    fn from(row: GoalProgressRow) -> Self {
        GoalWithProgress::new(row.goal, row.task_count, row.completed_task_count)
    }
}

#[derive(Debug, Clone)]
pub struct GoalService {
    db: DatabaseManager,
    time: Arc<dyn TimeProvider>,
}

impl GoalService {
    pub fn new(db: DatabaseManager, time: Arc<dyn TimeProvider>) -> Self {
        Self { db, time }
    }

    /// Goals with a target date first, soonest first
    pub async fn list(&self, user_id: &str) -> AppResult<Vec<GoalWithProgress>> {
        let sql = format!(
            "{} WHERE g.user_id = ? GROUP BY g.id \
             ORDER BY g.target_date IS NULL, g.target_date, g.created_at",
            SELECT_WITH_PROGRESS
        );
        let rows = sqlx::query_as::<_, GoalProgressRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.db.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn get(&self, user_id: &str, id: &str) -> AppResult<GoalWithProgress> {
        let sql = format!("{} WHERE g.id = ? AND g.user_id = ? GROUP BY g.id", SELECT_WITH_PROGRESS);
        sqlx::query_as::<_, GoalProgressRow>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.db.pool)
            .await?
            .map(Into::into)
            .ok_or_else(|| AppError::not_found("Goal"))
    }

    pub async fn create(&self, user_id: &str, create: CreateGoal) -> AppResult<GoalWithProgress> {
        let goal = create.into_goal(user_id, self.time.now_utc())?;

        sqlx::query(
            "INSERT INTO goals (id, user_id, title, description, target_date, status, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&goal.id)
        .bind(&goal.user_id)
        .bind(&goal.title)
        .bind(&goal.description)
        .bind(goal.target_date)
        .bind(goal.status)
        .bind(goal.created_at)
        .bind(goal.updated_at)
        .execute(&self.db.pool)
        .await?;

        log_database_operation("INSERT", "goals", Some(1));
        Ok(GoalWithProgress::new(goal, 0, 0))
    }

    pub async fn update(&self, user_id: &str, id: &str, update: UpdateGoal) -> AppResult<GoalWithProgress> {
        let mut goal = self.get(user_id, id).await?.goal;
        update.apply_to(&mut goal)?;
        goal.updated_at = self.time.now_utc();

        sqlx::query(
            "UPDATE goals SET title = ?, description = ?, target_date = ?, status = ?, updated_at = ? \
             WHERE id = ? AND user_id = ?",
        )
        .bind(&goal.title)
        .bind(&goal.description)
        .bind(goal.target_date)
        .bind(goal.status)
        .bind(goal.updated_at)
        .bind(&goal.id)
        .bind(user_id)
        .execute(&self.db.pool)
        .await?;

        self.get(user_id, id).await
    }

    /// Delete a goal. Its tasks are kept without a goal.
    pub async fn delete(&self, user_id: &str, id: &str) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM goals WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.db.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Goal"));
        }
        log_database_operation("DELETE", "goals", Some(result.rows_affected()));
        Ok(())
    }
}
