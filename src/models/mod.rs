//! Models module for Momentum
//!
//! Contains all data models and their validation logic.

use serde::{Deserialize, Deserializer};

pub mod category;
pub mod emotion;
pub mod focus_session;
pub mod goal;
pub mod project;
pub mod recurrence;
pub mod settings;
pub mod task;
pub mod template;
pub mod user;

// Re-export commonly used types
pub use category::{Category, CreateCategory, UpdateCategory};
pub use emotion::Emotion;
pub use focus_session::{FocusKind, FocusSession, FocusStats, FocusStatus};
pub use goal::{CreateGoal, Goal, GoalStatus, GoalWithProgress, UpdateGoal};
pub use project::{CreateProject, Project, UpdateProject};
pub use recurrence::{DayOfWeek, Frequency, RecurrenceRule};
pub use settings::{Theme, UpdateSettings, UserSettings};
pub use task::{CreateTask, Priority, Task, TaskFilter, TaskStatus, UpdateTask};
pub use template::{CreateTemplate, TaskTemplate, UpdateTemplate};
pub use user::User;

/// Deserialize a field that may be absent (`None`), `null` (`Some(None)`)
/// or set (`Some(Some(v))`). Pair with `#[serde(default)]`.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
