//! Momentum
//!
//! A focus-friendly personal task manager: tasks with recurrence, projects,
//! goals, templates, focus sessions with emotion tracking, per-user settings
//! and an optional AI assistant, served as a JSON API.

pub mod api;
pub mod config;
pub mod database;
pub mod error;
pub mod logging;
pub mod models;
pub mod server;
pub mod services;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use server::{create_app, AppState};
