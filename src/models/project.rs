//! Project Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::category::{is_valid_color, DEFAULT_COLOR};

pub const MAX_NAME_LENGTH: usize = 100;
pub const MAX_DESCRIPTION_LENGTH: usize = 5000;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Project {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub color: String,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProject {
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
}

impl CreateProject {
    /// Build a validated project owned by `user_id`
    pub fn into_project(self, user_id: &str, now: DateTime<Utc>) -> Result<Project, ProjectError> {
        let color = match self.color {
            Some(color) => normalize_color(&color)?,
            None => DEFAULT_COLOR.to_string(),
        };

        Ok(Project {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            name: normalize_name(&self.name)?,
            description: normalize_description(self.description)?,
            color,
            archived: false,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Partial update. `description: null` clears the description.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProject {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub description: Option<Option<String>>,
    pub color: Option<String>,
    pub archived: Option<bool>,
}

impl UpdateProject {
    pub fn apply_to(self, project: &mut Project) -> Result<(), ProjectError> {
        if let Some(name) = self.name {
            project.name = normalize_name(&name)?;
        }
        if let Some(description) = self.description {
            project.description = normalize_description(description)?;
        }
        if let Some(color) = self.color {
            project.color = normalize_color(&color)?;
        }
        if let Some(archived) = self.archived {
            project.archived = archived;
        }
        Ok(())
    }
}

fn normalize_name(name: &str) -> Result<String, ProjectError> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_LENGTH {
        return Err(ProjectError::InvalidName);
    }
    Ok(name.to_string())
}

fn normalize_description(description: Option<String>) -> Result<Option<String>, ProjectError> {
    match description {
        Some(text) if text.chars().count() > MAX_DESCRIPTION_LENGTH => {
            Err(ProjectError::DescriptionTooLong)
        }
        Some(text) if text.trim().is_empty() => Ok(None),
        other => Ok(other),
    }
}

fn normalize_color(color: &str) -> Result<String, ProjectError> {
    let color = color.trim();
    if !is_valid_color(color) {
        return Err(ProjectError::InvalidColor(color.to_string()));
    }
    Ok(color.to_lowercase())
}

#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("Project name must be 1-100 characters")]
    InvalidName,

    #[error("Project description must be at most 5000 characters")]
    DescriptionTooLong,

    #[error("Color '{0}' is invalid (expected #RRGGBB)")]
    InvalidColor(String),
}
