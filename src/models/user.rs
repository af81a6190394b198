//! User Model
//!
//! Account records and credential validation.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Minimum password length
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length
pub const MAX_PASSWORD_LENGTH: usize = 256;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.-]{3,32}$").expect("valid username regex"));

/// A registered user. Credentials never leave the server.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: String,
    pub username: String,

    #[serde(skip_serializing, default)]
    pub password_hash: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user from an already hashed password
    pub fn new(username: String, password_hash: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            username,
            password_hash,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Registration / login payload
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Validate the payload for registration
    pub fn validate(&self) -> Result<(), UserError> {
        validate_username(&self.username)?;
        validate_password(&self.password)
    }
}

/// Validate a username: 3-32 characters of letters, digits, `_`, `.` or `-`
pub fn validate_username(username: &str) -> Result<(), UserError> {
    if !USERNAME_RE.is_match(username) {
        return Err(UserError::InvalidUsername(username.to_string()));
    }
    Ok(())
}

/// Validate a password's length
pub fn validate_password(password: &str) -> Result<(), UserError> {
    let length = password.chars().count();
    if !(MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH).contains(&length) {
        return Err(UserError::InvalidPassword);
    }
    Ok(())
}

/// User validation and authentication errors
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("Username '{0}' is invalid (3-32 letters, digits, '_', '.' or '-')")]
    InvalidUsername(String),

    #[error("Password must be 8-256 characters")]
    InvalidPassword,

    #[error("Username '{0}' is already taken")]
    UsernameTaken(String),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Missing or invalid session")]
    InvalidSession,
}
