//! API module for Momentum
//!
//! Contains all REST API endpoints and routing.

pub mod ai;
pub mod auth;
pub mod categories;
pub mod extract;
pub mod focus_sessions;
pub mod goals;
pub mod health;
pub mod projects;
pub mod recurrence;
pub mod settings;
pub mod tasks;
pub mod templates;

use axum::{routing::get, Router};

use crate::server::AppState;

pub use auth::{AuthUser, SESSION_COOKIE};

/// Every `/api` route, relative to the `/api` prefix
pub fn create_api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/auth", auth::create_auth_routes())
        .nest("/categories", categories::create_category_routes())
        .nest("/projects", projects::create_project_routes())
        .nest("/goals", goals::create_goal_routes())
        .nest("/tasks", tasks::create_task_routes())
        .nest("/recurrence", recurrence::create_recurrence_routes())
        .nest("/templates", templates::create_template_routes())
        .nest("/focus-sessions", focus_sessions::create_focus_session_routes())
        .nest("/settings", settings::create_settings_routes())
        .nest("/ai", ai::create_ai_routes())
}
