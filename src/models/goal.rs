//! Goal Model
//!
//! Longer-term outcomes that tasks contribute to. Progress is derived from
//! the linked tasks and never stored.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use strum::{Display, EnumString};
use uuid::Uuid;

pub const MAX_TITLE_LENGTH: usize = 200;
pub const MAX_DESCRIPTION_LENGTH: usize = 5000;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Display, EnumString,
)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GoalStatus {
    #[default]
    Active,
    Achieved,
    Abandoned,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Goal {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub target_date: Option<NaiveDate>,
    pub status: GoalStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A goal together with the progress of its linked tasks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalWithProgress {
    #[serde(flatten)]
    pub goal: Goal,
    pub task_count: i64,
    pub completed_task_count: i64,
    pub progress: i64,
}

impl GoalWithProgress {
    pub fn new(goal: Goal, task_count: i64, completed_task_count: i64) -> Self {
        Self {
            goal,
            task_count,
            completed_task_count,
            progress: progress_percent(task_count, completed_task_count),
        }
    }
}

/// Whole-number completion percentage, 0 when there is nothing to complete
pub fn progress_percent(total: i64, completed: i64) -> i64 {
    if total <= 0 {
        return 0;
    }
    (completed.clamp(0, total) * 100) / total
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateGoal {
    pub title: String,
    pub description: Option<String>,
    pub target_date: Option<NaiveDate>,
}

impl CreateGoal {
    pub fn into_goal(self, user_id: &str, now: DateTime<Utc>) -> Result<Goal, GoalError> {
        Ok(Goal {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            title: normalize_title(&self.title)?,
            description: normalize_description(self.description)?,
            target_date: self.target_date,
            status: GoalStatus::Active,
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateGoal {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub target_date: Option<Option<NaiveDate>>,
    pub status: Option<GoalStatus>,
}

impl UpdateGoal {
    pub fn apply_to(self, goal: &mut Goal) -> Result<(), GoalError> {
        if let Some(title) = self.title {
            goal.title = normalize_title(&title)?;
        }
        if let Some(description) = self.description {
            goal.description = normalize_description(description)?;
        }
        if let Some(target_date) = self.target_date {
            goal.target_date = target_date;
        }
        if let Some(status) = self.status {
            goal.status = status;
        }
        Ok(())
    }
}

fn normalize_title(title: &str) -> Result<String, GoalError> {
    let title = title.trim();
    if title.is_empty() || title.chars().count() > MAX_TITLE_LENGTH {
        return Err(GoalError::InvalidTitle);
    }
    Ok(title.to_string())
}

fn normalize_description(description: Option<String>) -> Result<Option<String>, GoalError> {
    match description {
        Some(text) if text.chars().count() > MAX_DESCRIPTION_LENGTH => {
            Err(GoalError::DescriptionTooLong)
        }
        Some(text) if text.trim().is_empty() => Ok(None),
        other => Ok(other),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GoalError {
    #[error("Goal title must be 1-200 characters")]
    InvalidTitle,

    #[error("Goal description must be at most 5000 characters")]
    DescriptionTooLong,
}
