//! Category Model
//!
//! User-defined, colour-coded buckets for tasks and templates.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Colour given to categories and projects created without one
pub const DEFAULT_COLOR: &str = "#6366f1";

/// Maximum category name length
pub const MAX_NAME_LENGTH: usize = 50;

static COLOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("valid color regex"));

/// Whether `color` is a `#RRGGBB` hex colour
pub fn is_valid_color(color: &str) -> bool {
    COLOR_RE.is_match(color)
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    pub fn new(user_id: &str, name: String, color: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            name,
            color,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCategory {
    pub name: String,
    pub color: Option<String>,
}

impl CreateCategory {
    /// Validated, normalised name and colour
    pub fn normalized(&self) -> Result<(String, String), CategoryError> {
        let name = normalize_name(&self.name)?;
        let color = match &self.color {
            Some(color) => normalize_color(color)?,
            None => DEFAULT_COLOR.to_string(),
        };
        Ok((name, color))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCategory {
    pub name: Option<String>,
    pub color: Option<String>,
}

impl UpdateCategory {
    /// Apply the update to `category`
    pub fn apply_to(&self, category: &mut Category) -> Result<(), CategoryError> {
        if let Some(name) = &self.name {
            category.name = normalize_name(name)?;
        }
        if let Some(color) = &self.color {
            category.color = normalize_color(color)?;
        }
        Ok(())
    }
}

fn normalize_name(name: &str) -> Result<String, CategoryError> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_LENGTH {
        return Err(CategoryError::InvalidName);
    }
    Ok(name.to_string())
}

fn normalize_color(color: &str) -> Result<String, CategoryError> {
    let color = color.trim();
    if !is_valid_color(color) {
        return Err(CategoryError::InvalidColor(color.to_string()));
    }
    Ok(color.to_lowercase())
}

#[derive(Debug, thiserror::Error)]
pub enum CategoryError {
    #[error("Category name must be 1-50 characters")]
    InvalidName,

    #[error("Color '{0}' is invalid (expected #RRGGBB)")]
    InvalidColor(String),

    #[error("A category named '{0}' already exists")]
    DuplicateName(String),
}
