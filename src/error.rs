//! Error handling for Momentum
//!
//! Centralized error types and handling for the application.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::models::category::CategoryError;
use crate::models::focus_session::FocusSessionError;
use crate::models::goal::GoalError;
use crate::models::project::ProjectError;
use crate::models::recurrence::RecurrenceError;
use crate::models::settings::SettingsError;
use crate::models::task::{TaskCreateError, TaskError};
use crate::models::template::TemplateError;
use crate::models::user::UserError;
use crate::services::ai_service::AiError;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    User(#[from] UserError),

    #[error("{0}")]
    Task(#[from] TaskError),

    #[error("{0}")]
    Recurrence(#[from] RecurrenceError),

    #[error("{0}")]
    Category(#[from] CategoryError),

    #[error("{0}")]
    Project(#[from] ProjectError),

    #[error("{0}")]
    Goal(#[from] GoalError),

    #[error("{0}")]
    Template(#[from] TemplateError),

    #[error("{0}")]
    FocusSession(#[from] FocusSessionError),

    #[error("{0}")]
    Settings(#[from] SettingsError),

    #[error("{0}")]
    Ai(#[from] AiError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get the appropriate HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) | AppError::Recurrence(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::User(e) => match e {
                UserError::InvalidCredentials | UserError::InvalidSession => {
                    StatusCode::UNAUTHORIZED
                }
                UserError::UsernameTaken(_) => StatusCode::CONFLICT,
                _ => StatusCode::BAD_REQUEST,
            },
            AppError::Task(e) => match e {
                TaskError::AlreadyCompleted | TaskError::NotCompleted => StatusCode::CONFLICT,
                _ => StatusCode::BAD_REQUEST,
            },
            AppError::Category(e) => match e {
                CategoryError::DuplicateName(_) => StatusCode::CONFLICT,
                _ => StatusCode::BAD_REQUEST,
            },
            AppError::Template(e) => match e {
                TemplateError::DuplicateName(_) => StatusCode::CONFLICT,
                _ => StatusCode::BAD_REQUEST,
            },
            AppError::Project(_) | AppError::Goal(_) => StatusCode::BAD_REQUEST,
            AppError::FocusSession(e) => match e {
                FocusSessionError::AlreadyRunning | FocusSessionError::NotRunning => {
                    StatusCode::CONFLICT
                }
                _ => StatusCode::BAD_REQUEST,
            },
            AppError::Settings(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Ai(e) => match e {
                AiError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
                AiError::Disabled => StatusCode::FORBIDDEN,
                AiError::Provider(_) | AiError::Http(_) => StatusCode::BAD_GATEWAY,
                AiError::InvalidPrompt(_) => StatusCode::BAD_REQUEST,
            },
        }
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "DatabaseError",
            AppError::User(UserError::InvalidCredentials) => "InvalidCredentials",
            AppError::User(UserError::InvalidSession) => "Unauthorized",
            AppError::User(UserError::UsernameTaken(_)) => "Conflict",
            AppError::User(_) => "UserError",
            AppError::Task(TaskError::AlreadyCompleted | TaskError::NotCompleted) => "Conflict",
            AppError::Task(_) => "TaskError",
            AppError::Recurrence(_) => "RecurrenceError",
            AppError::Category(CategoryError::DuplicateName(_)) => "Conflict",
            AppError::Category(_) => "CategoryError",
            AppError::Project(_) => "ProjectError",
            AppError::Goal(_) => "GoalError",
            AppError::Template(TemplateError::DuplicateName(_)) => "Conflict",
            AppError::Template(_) => "TemplateError",
            AppError::FocusSession(
                FocusSessionError::AlreadyRunning | FocusSessionError::NotRunning,
            ) => "Conflict",
            AppError::FocusSession(_) => "FocusSessionError",
            AppError::Settings(_) => "ValidationError",
            AppError::Ai(AiError::NotConfigured) => "ServiceUnavailable",
            AppError::Ai(AiError::Disabled) => "Forbidden",
            AppError::Ai(AiError::InvalidPrompt(_)) => "ValidationError",
            AppError::Ai(_) => "AiProviderError",
            AppError::Validation(_) => "ValidationError",
            AppError::NotFound(_) => "NotFound",
            AppError::Unauthorized => "Unauthorized",
            AppError::Internal(_) => "InternalError",
        }
    }

    /// Check if this error should be logged as an error vs warning
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Field-level details attached to settings validation failures
    fn details(&self) -> Option<serde_json::Value> {
        match self {
            AppError::Settings(e) => Some(json!([{
                "field": e.field(),
                "message": e.to_string(),
            }])),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let message = match &self {
            // Internal details stay in the logs.
            AppError::Database(_) => "A database error occurred".to_string(),
            other => other.to_string(),
        };

        if self.is_server_error() {
            crate::logging::log_error(&self.to_string(), error_code, None);
        } else {
            crate::logging::log_warning(&self.to_string(), error_code, None);
        }

        let timestamp = chrono::Utc::now().timestamp();
        let mut body = json!({
            "error": error_code,
            "message": message,
            "timestamp": timestamp
        });
        if let Some(details) = self.details() {
            body["details"] = details;
        }

        (status, Json(body)).into_response()
    }
}

impl From<TaskCreateError> for AppError {
    fn from(err: TaskCreateError) -> Self {
        match err {
            TaskCreateError::Task(e) => AppError::Task(e),
            TaskCreateError::Recurrence(e) => AppError::Recurrence(e),
        }
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn not_found(resource: &str) -> Self {
        AppError::NotFound(format!("{} not found", resource))
    }

    pub fn validation_error(message: &str) -> Self {
        AppError::Validation(message.to_string())
    }

    pub fn internal_error(message: &str) -> Self {
        AppError::Internal(message.to_string())
    }
}
