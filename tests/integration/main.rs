//! API integration tests

mod common;

mod ai_api;
mod auth_api;
mod focus_session_api;
mod organization_api;
mod settings_api;
mod task_api;
mod template_api;
