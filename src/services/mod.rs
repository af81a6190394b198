//! Services module for Momentum
//!
//! Contains all business logic and service implementations.

pub mod ai_service;
pub mod auth_service;
pub mod category_service;
pub mod focus_service;
pub mod goal_service;
pub mod project_service;
pub mod settings_service;
pub mod task_service;
pub mod template_service;
pub mod time_provider;

// Re-export commonly used services
pub use ai_service::{AiService, AnthropicProvider, TextCompletionProvider};
pub use auth_service::{AuthService, SessionSigner};
pub use category_service::CategoryService;
pub use focus_service::FocusService;
pub use goal_service::GoalService;
pub use project_service::ProjectService;
pub use settings_service::SettingsService;
pub use task_service::TaskService;
pub use template_service::TemplateService;
pub use time_provider::{MockTimeProvider, SystemTimeProvider, TimeProvider};
