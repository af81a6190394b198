//! Task Model
//!
//! Tasks, their filters and the rules for moving between states. A task with
//! a recurrence rule is one instance of a series; completing it produces the
//! next instance.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use strum::{Display, EnumString};
use uuid::Uuid;

use super::emotion::Emotion;
use super::recurrence::{RecurrenceError, RecurrenceRule};

pub const MAX_TITLE_LENGTH: usize = 200;
pub const MAX_DESCRIPTION_LENGTH: usize = 5000;
pub const MAX_ESTIMATED_MINUTES: i64 = 1440;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Display, EnumString,
)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Display, EnumString,
)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: Priority,
    pub category_id: Option<String>,
    pub project_id: Option<String>,
    pub goal_id: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub estimated_minutes: Option<i64>,
    pub emotion: Option<Emotion>,
    pub recurrence: Option<Json<RecurrenceRule>>,

    /// Local date the series was anchored on
    pub recurrence_anchor: Option<NaiveDate>,

    /// First task of the series this instance belongs to. Kept after the
    /// first task is deleted.
    pub recurrence_parent_id: Option<String>,

    /// Zero-based position within the series
    pub occurrence_index: i64,

    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn rule(&self) -> Option<&RecurrenceRule> {
        self.recurrence.as_ref().map(|rule| &rule.0)
    }

    pub fn is_done(&self) -> bool {
        self.status == TaskStatus::Done
    }

    /// Move to `status`, keeping `completed_at` consistent
    pub fn set_status(&mut self, status: TaskStatus, now: DateTime<Utc>) {
        match (self.status, status) {
            (TaskStatus::Done, TaskStatus::Done) => {}
            (_, TaskStatus::Done) => self.completed_at = Some(now),
            _ => self.completed_at = None,
        }
        self.status = status;
    }

    /// Mark the task done
    pub fn complete(&mut self, emotion: Option<Emotion>, now: DateTime<Utc>) -> Result<(), TaskError> {
        if self.is_done() {
            return Err(TaskError::AlreadyCompleted);
        }
        self.set_status(TaskStatus::Done, now);
        if emotion.is_some() {
            self.emotion = emotion;
        }
        self.updated_at = now;
        Ok(())
    }

    /// Move a done task back to todo
    pub fn reopen(&mut self, now: DateTime<Utc>) -> Result<(), TaskError> {
        if !self.is_done() {
            return Err(TaskError::NotCompleted);
        }
        self.set_status(TaskStatus::Todo, now);
        self.updated_at = now;
        Ok(())
    }

    /// Anchor the recurrence series on the local date of the due date
    pub fn anchor_recurrence(&mut self, tz: Tz) -> Result<(), RecurrenceError> {
        match (self.rule(), self.due_date) {
            (None, _) => {
                self.recurrence_anchor = None;
                Ok(())
            }
            (Some(_), None) => Err(RecurrenceError::MissingDueDate),
            (Some(rule), Some(due)) => {
                let anchor = due.with_timezone(&tz).date_naive();
                rule.validate_for(anchor)?;
                self.recurrence_anchor = Some(anchor);
                Ok(())
            }
        }
    }

    /// The instance that follows this one in its series, due at the same
    /// local time of day. `None` when the task does not recur or the series
    /// has ended.
    pub fn next_instance(&self, tz: Tz, now: DateTime<Utc>) -> Option<Task> {
        let rule = self.rule()?;
        let due = self.due_date?.with_timezone(&tz);
        let due_date = due.date_naive();
        let anchor = self.recurrence_anchor.unwrap_or(due_date);

        let (index, next_date) = rule.occurrence_after(anchor, due_date)?;
        let next_due = local_to_utc(tz, next_date.and_time(due.time()))?;

        Some(Task {
            id: Uuid::new_v4().to_string(),
            status: TaskStatus::Todo,
            due_date: Some(next_due),
            emotion: None,
            recurrence_anchor: Some(anchor),
            recurrence_parent_id: Some(
                self.recurrence_parent_id.clone().unwrap_or_else(|| self.id.clone()),
            ),
            occurrence_index: i64::from(index),
            completed_at: None,
            created_at: now,
            updated_at: now,
            ..self.clone()
        })
    }
}

/// Resolve a local wall-clock time. A time skipped by a DST jump moves
/// forward by an hour.
fn local_to_utc(tz: Tz, local: chrono::NaiveDateTime) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&local)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(local + Duration::hours(1))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub category_id: Option<String>,
    pub project_id: Option<String>,
    pub goal_id: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub estimated_minutes: Option<i64>,
    pub recurrence: Option<RecurrenceRule>,
}

impl CreateTask {
    /// Build a validated task owned by `user_id`. References are checked by
    /// the caller.
    pub fn into_task(self, user_id: &str, tz: Tz, now: DateTime<Utc>) -> Result<Task, TaskCreateError> {
        let status = self.status.unwrap_or_default();

        let mut task = Task {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            title: normalize_title(&self.title)?,
            description: normalize_description(self.description)?,
            status,
            priority: self.priority.unwrap_or_default(),
            category_id: self.category_id,
            project_id: self.project_id,
            goal_id: self.goal_id,
            due_date: self.due_date,
            estimated_minutes: validate_estimate(self.estimated_minutes)?,
            emotion: None,
            recurrence: self.recurrence.map(Json),
            recurrence_anchor: None,
            recurrence_parent_id: None,
            occurrence_index: 0,
            completed_at: (status == TaskStatus::Done).then_some(now),
            created_at: now,
            updated_at: now,
        };
        task.anchor_recurrence(tz)?;
        Ok(task)
    }
}

/// Partial update. Nullable fields distinguish "absent" from `null`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTask {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub description: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub category_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub project_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub goal_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub due_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub estimated_minutes: Option<Option<i64>>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub emotion: Option<Option<Emotion>>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub recurrence: Option<Option<RecurrenceRule>>,
}

impl UpdateTask {
    pub fn apply_to(self, task: &mut Task, tz: Tz, now: DateTime<Utc>) -> Result<(), TaskCreateError> {
        if let Some(title) = self.title {
            task.title = normalize_title(&title)?;
        }
        if let Some(description) = self.description {
            task.description = normalize_description(description)?;
        }
        if let Some(status) = self.status {
            task.set_status(status, now);
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(category_id) = self.category_id {
            task.category_id = category_id;
        }
        if let Some(project_id) = self.project_id {
            task.project_id = project_id;
        }
        if let Some(goal_id) = self.goal_id {
            task.goal_id = goal_id;
        }
        if let Some(estimated_minutes) = self.estimated_minutes {
            task.estimated_minutes = validate_estimate(estimated_minutes)?;
        }
        if let Some(emotion) = self.emotion {
            task.emotion = emotion;
        }

        let due_changed = self.due_date.is_some();
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }

        // A new rule starts a new series from the current due date.
        if let Some(recurrence) = self.recurrence {
            task.recurrence = recurrence.map(Json);
            task.recurrence_parent_id = None;
            task.occurrence_index = 0;
            task.anchor_recurrence(tz)?;
        } else if due_changed && task.rule().is_some() && task.due_date.is_none() {
            return Err(RecurrenceError::MissingDueDate.into());
        }

        task.updated_at = now;
        Ok(())
    }
}

/// Body of a completion request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompleteTask {
    pub emotion: Option<Emotion>,
}

/// A completed task and, for a recurring one, the instance created after it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskCompletion {
    pub task: Task,
    pub next_task: Option<Task>,
}

/// List filters, all optional and combined with AND
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub category_id: Option<String>,
    pub project_id: Option<String>,
    pub goal_id: Option<String>,
    pub due_before: Option<DateTime<Utc>>,
    pub due_after: Option<DateTime<Utc>>,
    pub q: Option<String>,
    pub overdue: Option<bool>,
}

fn normalize_title(title: &str) -> Result<String, TaskError> {
    let title = title.trim();
    if title.is_empty() || title.chars().count() > MAX_TITLE_LENGTH {
        return Err(TaskError::InvalidTitle);
    }
    Ok(title.to_string())
}

fn normalize_description(description: Option<String>) -> Result<Option<String>, TaskError> {
    match description {
        Some(text) if text.chars().count() > MAX_DESCRIPTION_LENGTH => {
            Err(TaskError::DescriptionTooLong)
        }
        Some(text) if text.trim().is_empty() => Ok(None),
        other => Ok(other),
    }
}

fn validate_estimate(minutes: Option<i64>) -> Result<Option<i64>, TaskError> {
    match minutes {
        Some(m) if !(1..=MAX_ESTIMATED_MINUTES).contains(&m) => Err(TaskError::InvalidEstimate(m)),
        other => Ok(other),
    }
}

/// Task validation and state errors
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("Task title must be 1-200 characters")]
    InvalidTitle,

    #[error("Task description must be at most 5000 characters")]
    DescriptionTooLong,

    #[error("Estimated minutes {0} is invalid (must be 1-1440)")]
    InvalidEstimate(i64),

    #[error("Referenced {0} does not exist")]
    InvalidReference(&'static str),

    #[error("Task is already completed")]
    AlreadyCompleted,

    #[error("Task is not completed")]
    NotCompleted,
}

/// Errors from building or updating a task
#[derive(Debug, thiserror::Error)]
pub enum TaskCreateError {
    #[error(transparent)]
    Task(#[from] TaskError),

    #[error(transparent)]
    Recurrence(#[from] RecurrenceError),
}
