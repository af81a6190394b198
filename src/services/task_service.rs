//! Task Service
//!
//! Task CRUD, filtering, completion and recurring-instance generation.

use std::sync::Arc;

use chrono_tz::Tz;
use sqlx::{Executor, QueryBuilder, Sqlite};
use tracing::debug;

use crate::database::DatabaseManager;
use crate::error::{AppError, AppResult};
use crate::logging::{log_database_operation, log_task_completed};
use crate::models::task::{
    CompleteTask, CreateTask, Task, TaskCompletion, TaskError, TaskFilter, UpdateTask,
};
use crate::services::settings_service::SettingsService;
use crate::services::time_provider::TimeProvider;

const ORDER_BY: &str = " ORDER BY due_date IS NULL, due_date, \
    CASE priority WHEN 'urgent' THEN 0 WHEN 'high' THEN 1 WHEN 'medium' THEN 2 ELSE 3 END, \
    created_at";

async fn insert_task<'e, E>(executor: E, task: &Task) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO tasks (
            id, user_id, title, description, status, priority, category_id, project_id,
            goal_id, due_date, estimated_minutes, emotion, recurrence, recurrence_anchor,
            recurrence_parent_id, occurrence_index, completed_at, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&task.id)
    .bind(&task.user_id)
    .bind(&task.title)
    .bind(&task.description)
    .bind(task.status)
    .bind(task.priority)
    .bind(&task.category_id)
    .bind(&task.project_id)
    .bind(&task.goal_id)
    .bind(task.due_date)
    .bind(task.estimated_minutes)
    .bind(task.emotion)
    .bind(&task.recurrence)
    .bind(task.recurrence_anchor)
    .bind(&task.recurrence_parent_id)
    .bind(task.occurrence_index)
    .bind(task.completed_at)
    .bind(task.created_at)
    .bind(task.updated_at)
    .execute(executor)
    .await?;
    Ok(())
}

async fn save_task<'e, E>(executor: E, task: &Task) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        UPDATE tasks SET
            title = ?, description = ?, status = ?, priority = ?, category_id = ?,
            project_id = ?, goal_id = ?, due_date = ?, estimated_minutes = ?, emotion = ?,
            recurrence = ?, recurrence_anchor = ?, recurrence_parent_id = ?,
            occurrence_index = ?, completed_at = ?, updated_at = ?
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(&task.title)
    .bind(&task.description)
    .bind(task.status)
    .bind(task.priority)
    .bind(&task.category_id)
    .bind(&task.project_id)
    .bind(&task.goal_id)
    .bind(task.due_date)
    .bind(task.estimated_minutes)
    .bind(task.emotion)
    .bind(&task.recurrence)
    .bind(task.recurrence_anchor)
    .bind(&task.recurrence_parent_id)
    .bind(task.occurrence_index)
    .bind(task.completed_at)
    .bind(task.updated_at)
    .bind(&task.id)
    .bind(&task.user_id)
    .execute(executor)
    .await?;
    Ok(())
}

/// Escape `%`, `_` and `\` for a LIKE pattern using `\` as the escape
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[derive(Debug, Clone)]
pub struct TaskService {
    db: DatabaseManager,
    settings: SettingsService,
    time: Arc<dyn TimeProvider>,
}

impl TaskService {
    pub fn new(db: DatabaseManager, settings: SettingsService, time: Arc<dyn TimeProvider>) -> Self {
        Self { db, settings, time }
    }

    async fn timezone(&self, user_id: &str) -> AppResult<Tz> {
        Ok(self.settings.get(user_id).await?.tz())
    }

    /// Whether `id` names a row of `table` owned by `user_id`
    async fn owns(&self, table: &str, user_id: &str, id: &str) -> AppResult<bool> {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE id = ? AND user_id = ?", table);
        let (count,): (i64,) = sqlx::query_as(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_one(&self.db.pool)
            .await?;
        Ok(count > 0)
    }

    async fn check_references(&self, task: &Task) -> AppResult<()> {
        let references = [
            ("categories", "category", &task.category_id),
            ("projects", "project", &task.project_id),
            ("goals", "goal", &task.goal_id),
        ];
        for (table, name, id) in references {
            if let Some(id) = id {
                if !self.owns(table, &task.user_id, id).await? {
                    return Err(TaskError::InvalidReference(name).into());
                }
            }
        }
        Ok(())
    }

    pub async fn list(&self, user_id: &str, filter: TaskFilter) -> AppResult<Vec<Task>> {
        let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM tasks WHERE user_id = ");
        query.push_bind(user_id);

        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status);
        }
        if let Some(priority) = filter.priority {
            query.push(" AND priority = ").push_bind(priority);
        }
        if let Some(category_id) = filter.category_id {
            query.push(" AND category_id = ").push_bind(category_id);
        }
        if let Some(project_id) = filter.project_id {
            query.push(" AND project_id = ").push_bind(project_id);
        }
        if let Some(goal_id) = filter.goal_id {
            query.push(" AND goal_id = ").push_bind(goal_id);
        }
        if let Some(due_before) = filter.due_before {
            query.push(" AND due_date < ").push_bind(due_before);
        }
        if let Some(due_after) = filter.due_after {
            query.push(" AND due_date > ").push_bind(due_after);
        }
        if let Some(q) = filter.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            query
                .push(" AND title LIKE ")
                .push_bind(format!("%{}%", escape_like(q)))
                .push(" ESCAPE '\\'");
        }
        if filter.overdue == Some(true) {
            query
                .push(" AND status != 'done' AND due_date IS NOT NULL AND due_date < ")
                .push_bind(self.time.now_utc());
        }
        query.push(ORDER_BY);

        let tasks = query.build_query_as::<Task>().fetch_all(&self.db.pool).await?;
        debug!(user_id = %user_id, count = tasks.len(), "Listed tasks");
        Ok(tasks)
    }

    pub async fn get(&self, user_id: &str, id: &str) -> AppResult<Task> {
        sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.db.pool)
            .await?
            .ok_or_else(|| AppError::not_found("Task"))
    }

    pub async fn create(&self, user_id: &str, create: CreateTask) -> AppResult<Task> {
        let tz = self.timezone(user_id).await?;
        let task = create.into_task(user_id, tz, self.time.now_utc())?;
        self.check_references(&task).await?;

        insert_task(&self.db.pool, &task).await?;
        log_database_operation("INSERT", "tasks", Some(1));
        Ok(task)
    }

    pub async fn update(&self, user_id: &str, id: &str, update: UpdateTask) -> AppResult<Task> {
        let tz = self.timezone(user_id).await?;
        let mut task = self.get(user_id, id).await?;
        update.apply_to(&mut task, tz, self.time.now_utc())?;
        self.check_references(&task).await?;

        save_task(&self.db.pool, &task).await?;
        Ok(task)
    }

    /// Delete a single task. Later instances of its series are kept.
    pub async fn delete(&self, user_id: &str, id: &str) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.db.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Task"));
        }
        log_database_operation("DELETE", "tasks", Some(result.rows_affected()));
        Ok(())
    }

    /// Mark a task done and, if it recurs, create the next instance
    pub async fn complete(&self, user_id: &str, id: &str, request: CompleteTask) -> AppResult<TaskCompletion> {
        let tz = self.timezone(user_id).await?;
        let now = self.time.now_utc();

        let mut tx = self.db.pool.begin().await?;
        let mut task = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::not_found("Task"))?;

        task.complete(request.emotion, now)?;
        save_task(&mut *tx, &task).await?;

        // A task completed, reopened and completed again already has its
        // next instance.
        let next_task = match task.next_instance(tz, now) {
            Some(next) => {
                let existing = sqlx::query_as::<_, Task>(
                    "SELECT * FROM tasks WHERE user_id = ? AND recurrence_parent_id = ? \
                     AND occurrence_index = ?",
                )
                .bind(user_id)
                .bind(&next.recurrence_parent_id)
                .bind(next.occurrence_index)
                .fetch_optional(&mut *tx)
                .await?;

                match existing {
                    Some(existing) => Some(existing),
                    None => {
                        insert_task(&mut *tx, &next).await?;
                        Some(next)
                    }
                }
            }
            None => None,
        };
        tx.commit().await?;

        log_task_completed(user_id, &task.id, next_task.as_ref().map(|t| t.id.as_str()));
        Ok(TaskCompletion { task, next_task })
    }

    /// Move a completed task back to todo
    pub async fn reopen(&self, user_id: &str, id: &str) -> AppResult<Task> {
        let mut task = self.get(user_id, id).await?;
        task.reopen(self.time.now_utc())?;
        save_task(&self.db.pool, &task).await?;
        Ok(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::connection::insert_test_user;
    use crate::models::recurrence::RecurrenceRule;
    use crate::models::task::{Priority, TaskStatus};
    use crate::services::time_provider::MockTimeProvider;
    use chrono::{DateTime, TimeZone, Utc};

    struct Fixture {
        service: TaskService,
        time: MockTimeProvider,
    }

    async fn fixture() -> Fixture {
        let db = DatabaseManager::in_memory().await.unwrap();
        insert_test_user(&db.pool, "u1").await;
        insert_test_user(&db.pool, "u2").await;
        let time = MockTimeProvider::new(Utc.with_ymd_and_hms(2025, 4, 10, 12, 0, 0).unwrap());
        let shared: Arc<dyn TimeProvider> = Arc::new(time.clone());
        let settings = SettingsService::new(db.clone(), shared.clone());
        Fixture {
            service: TaskService::new(db, settings, shared),
            time,
        }
    }

    fn due(day: u32, hour: u32) -> Option<DateTime<Utc>> {
        Some(Utc.with_ymd_and_hms(2025, 4, day, hour, 0, 0).unwrap())
    }

    fn task(title: &str) -> CreateTask {
        CreateTask {
            title: title.into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_list_ordering() {
        let f = fixture().await;
        let mut later = task("later");
        later.due_date = due(20, 9);
        let mut soon_low = task("soon-low");
        soon_low.due_date = due(11, 9);
        soon_low.priority = Some(Priority::Low);
        let mut soon_urgent = task("soon-urgent");
        soon_urgent.due_date = due(11, 9);
        soon_urgent.priority = Some(Priority::Urgent);

        for create in [task("undated"), later, soon_low, soon_urgent] {
            f.service.create("u1", create).await.unwrap();
        }

        let titles: Vec<String> = f
            .service
            .list("u1", TaskFilter::default())
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles, vec!["soon-urgent", "soon-low", "later", "undated"]);
    }

    #[tokio::test]
    async fn test_list_filters() {
        let f = fixture().await;
        let mut overdue = task("Renew passport");
        overdue.due_date = due(1, 9);
        f.service.create("u1", overdue).await.unwrap();
        let mut upcoming = task("Book 50% off flights");
        upcoming.due_date = due(15, 9);
        f.service.create("u1", upcoming).await.unwrap();
        f.service.create("u2", task("Renew lease")).await.unwrap();

        let filter = |json: &str| -> TaskFilter { serde_json::from_str(json).unwrap() };

        let overdue = f.service.list("u1", filter(r#"{"overdue": true}"#)).await.unwrap();
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].title, "Renew passport");

        let search = f.service.list("u1", filter(r#"{"q": "RENEW"}"#)).await.unwrap();
        assert_eq!(search.len(), 1);

        let percent = f.service.list("u1", filter(r#"{"q": "50%"}"#)).await.unwrap();
        assert_eq!(percent.len(), 1);

        let window = f
            .service
            .list("u1", filter(r#"{"due_after": "2025-04-10T00:00:00Z", "due_before": "2025-04-30T00:00:00Z"}"#))
            .await
            .unwrap();
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].title, "Book 50% off flights");
    }

    #[tokio::test]
    async fn test_foreign_references_rejected() {
        let f = fixture().await;
        let mut create = task("Sneaky");
        create.category_id = Some("not-mine".into());
        assert!(matches!(
            f.service.create("u1", create).await,
            Err(AppError::Task(TaskError::InvalidReference("category")))
        ));
    }

    #[tokio::test]
    async fn test_complete_recurring_spawns_next_instance() {
        let f = fixture().await;
        let mut create = task("Water plants");
        create.due_date = due(10, 8);
        create.recurrence = Some(RecurrenceRule::new(crate::models::recurrence::Frequency::Daily, 2));
        let first = f.service.create("u1", create).await.unwrap();

        let completion = f.service.complete("u1", &first.id, CompleteTask::default()).await.unwrap();
        assert_eq!(completion.task.status, TaskStatus::Done);
        let next = completion.next_task.unwrap();
        assert_eq!(next.due_date, due(12, 8));
        assert_eq!(next.recurrence_parent_id.as_deref(), Some(first.id.as_str()));

        let stored = f.service.get("u1", &next.id).await.unwrap();
        assert_eq!(stored.status, TaskStatus::Todo);
        assert_eq!(stored.rule(), first.rule());

        assert!(matches!(
            f.service.complete("u1", &first.id, CompleteTask::default()).await,
            Err(AppError::Task(TaskError::AlreadyCompleted))
        ));
    }

    async fn daily_series(f: &Fixture, title: &str) -> Task {
        let mut create = task(title);
        create.due_date = due(10, 8);
        create.recurrence = Some(RecurrenceRule::daily());
        f.service.create("u1", create).await.unwrap()
    }

    #[tokio::test]
    async fn test_recompleting_reuses_next_instance() {
        let f = fixture().await;
        let first = daily_series(&f, "Stretch").await;

        let completion = f.service.complete("u1", &first.id, CompleteTask::default()).await.unwrap();
        let next = completion.next_task.unwrap();
        f.service.reopen("u1", &first.id).await.unwrap();
        let again = f.service.complete("u1", &first.id, CompleteTask::default()).await.unwrap();

        assert_eq!(again.next_task.unwrap().id, next.id);
        let tasks = f.service.list("u1", TaskFilter::default()).await.unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks.iter().filter(|t| t.due_date == due(11, 8)).count(), 1);
    }

    #[tokio::test]
    async fn test_series_root_survives_deletion() {
        let f = fixture().await;
        let root = daily_series(&f, "Journal").await;

        let second = f
            .service
            .complete("u1", &root.id, CompleteTask::default())
            .await
            .unwrap()
            .next_task
            .unwrap();
        f.service.delete("u1", &root.id).await.unwrap();

        let stored = f.service.get("u1", &second.id).await.unwrap();
        assert_eq!(stored.recurrence_parent_id.as_deref(), Some(root.id.as_str()));

        let third = f
            .service
            .complete("u1", &second.id, CompleteTask::default())
            .await
            .unwrap()
            .next_task
            .unwrap();
        assert_eq!(third.recurrence_parent_id.as_deref(), Some(root.id.as_str()));
        assert_eq!(third.occurrence_index, 2);
        assert_eq!(third.due_date, due(12, 8));
    }

    #[tokio::test]
    async fn test_reopen_and_delete() {
        let f = fixture().await;
        let created = f.service.create("u1", task("Laundry")).await.unwrap();

        assert!(f.service.reopen("u1", &created.id).await.is_err());
        f.time.advance_minutes(5);
        f.service.complete("u1", &created.id, CompleteTask::default()).await.unwrap();
        let reopened = f.service.reopen("u1", &created.id).await.unwrap();
        assert!(reopened.completed_at.is_none());

        assert!(f.service.delete("u2", &created.id).await.is_err());
        f.service.delete("u1", &created.id).await.unwrap();
        assert!(matches!(f.service.get("u1", &created.id).await, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }
}
