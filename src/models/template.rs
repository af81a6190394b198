//! Task Template Model
//!
//! Reusable task blueprints. Instantiating a template yields a `CreateTask`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use super::recurrence::{RecurrenceError, RecurrenceRule};
use super::task::{CreateTask, Priority, MAX_DESCRIPTION_LENGTH, MAX_ESTIMATED_MINUTES, MAX_TITLE_LENGTH};

pub const MAX_NAME_LENGTH: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TaskTemplate {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub category_id: Option<String>,
    pub estimated_minutes: Option<i64>,
    pub recurrence: Option<Json<RecurrenceRule>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskTemplate {
    /// The task this template produces, with optional overrides
    pub fn instantiate(&self, overrides: InstantiateTemplate) -> CreateTask {
        CreateTask {
            title: overrides.title.unwrap_or_else(|| self.title.clone()),
            description: self.description.clone(),
            status: None,
            priority: Some(self.priority),
            category_id: self.category_id.clone(),
            project_id: overrides.project_id,
            goal_id: overrides.goal_id,
            due_date: overrides.due_date,
            estimated_minutes: self.estimated_minutes,
            recurrence: self.recurrence.as_ref().map(|rule| rule.0.clone()),
        }
    }

    fn validate(&self) -> Result<(), TemplateError> {
        let name_length = self.name.chars().count();
        if self.name.is_empty() || name_length > MAX_NAME_LENGTH {
            return Err(TemplateError::InvalidName);
        }
        let title_length = self.title.chars().count();
        if self.title.is_empty() || title_length > MAX_TITLE_LENGTH {
            return Err(TemplateError::InvalidTitle);
        }
        if self
            .description
            .as_ref()
            .is_some_and(|d| d.chars().count() > MAX_DESCRIPTION_LENGTH)
        {
            return Err(TemplateError::DescriptionTooLong);
        }
        if let Some(minutes) = self.estimated_minutes {
            if !(1..=MAX_ESTIMATED_MINUTES).contains(&minutes) {
                return Err(TemplateError::InvalidEstimate(minutes));
            }
        }
        if let Some(rule) = &self.recurrence {
            rule.0.validate()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTemplate {
    pub name: String,
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub category_id: Option<String>,
    pub estimated_minutes: Option<i64>,
    pub recurrence: Option<RecurrenceRule>,
}

impl CreateTemplate {
    pub fn into_template(self, user_id: &str, now: DateTime<Utc>) -> Result<TaskTemplate, TemplateError> {
        let template = TaskTemplate {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            name: self.name.trim().to_string(),
            title: self.title.trim().to_string(),
            description: self.description.filter(|d| !d.trim().is_empty()),
            priority: self.priority.unwrap_or_default(),
            category_id: self.category_id,
            estimated_minutes: self.estimated_minutes,
            recurrence: self.recurrence.map(Json),
            created_at: now,
            updated_at: now,
        };
        template.validate()?;
        Ok(template)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTemplate {
    pub name: Option<String>,
    pub title: Option<String>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub description: Option<Option<String>>,
    pub priority: Option<Priority>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub category_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub estimated_minutes: Option<Option<i64>>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub recurrence: Option<Option<RecurrenceRule>>,
}

impl UpdateTemplate {
    pub fn apply_to(self, template: &mut TaskTemplate, now: DateTime<Utc>) -> Result<(), TemplateError> {
        if let Some(name) = self.name {
            template.name = name.trim().to_string();
        }
        if let Some(title) = self.title {
            template.title = title.trim().to_string();
        }
        if let Some(description) = self.description {
            template.description = description.filter(|d| !d.trim().is_empty());
        }
        if let Some(priority) = self.priority {
            template.priority = priority;
        }
        if let Some(category_id) = self.category_id {
            template.category_id = category_id;
        }
        if let Some(estimated_minutes) = self.estimated_minutes {
            template.estimated_minutes = estimated_minutes;
        }
        if let Some(recurrence) = self.recurrence {
            template.recurrence = recurrence.map(Json);
        }
        template.validate()?;
        template.updated_at = now;
        Ok(())
    }
}

/// Overrides applied when creating a task from a template
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InstantiateTemplate {
    pub title: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub project_id: Option<String>,
    pub goal_id: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("Template name must be 1-100 characters")]
    InvalidName,

    #[error("Template title must be 1-200 characters")]
    InvalidTitle,

    #[error("Template description must be at most 5000 characters")]
    DescriptionTooLong,

    #[error("Estimated minutes {0} is invalid (must be 1-1440)")]
    InvalidEstimate(i64),

    #[error("A template named '{0}' already exists")]
    DuplicateName(String),

    #[error("Referenced category does not exist")]
    InvalidCategory,

    #[error(transparent)]
    Recurrence(#[from] RecurrenceError),
}
