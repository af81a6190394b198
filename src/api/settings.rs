//! Settings API endpoints
//!
//! Per-user focus durations, goals, theme and timezone. Validation failures
//! are reported as 422 with field details.

use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use tracing::debug;

use crate::api::auth::AuthUser;
use crate::error::AppResult;
use crate::models::settings::{UpdateSettings, UserSettings};
use crate::server::AppState;

/// Create settings API routes
pub fn create_settings_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(get_settings).put(update_settings).patch(update_settings),
        )
        .route("/reset", post(reset_settings))
}

/// Get current settings, creating defaults if missing
pub async fn get_settings(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<UserSettings>> {
    debug!("GET /api/settings - Getting settings");
    Ok(Json(state.settings.get(user.id()).await?))
}

/// Partially update settings
pub async fn update_settings(
    State(state): State<AppState>,
    user: AuthUser,
    Json(update): Json<UpdateSettings>,
) -> AppResult<Json<UserSettings>> {
    debug!("PATCH /api/settings - Updating settings: {:?}", update);
    Ok(Json(state.settings.update(user.id(), update).await?))
}

/// Reset settings to defaults
pub async fn reset_settings(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<UserSettings>> {
    debug!("POST /api/settings/reset - Resetting settings to defaults");
    Ok(Json(state.settings.reset(user.id()).await?))
}
