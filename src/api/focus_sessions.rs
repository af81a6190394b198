//! Focus session API endpoints
//!
//! Starting, completing and abandoning the running session, logging past
//! sessions, history and statistics.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use tracing::debug;

use crate::api::auth::AuthUser;
use crate::api::extract::OptionalJson;
use crate::error::AppResult;
use crate::models::focus_session::{
    CompleteFocusSession, FocusSession, FocusSessionCompletion, FocusSessionFilter, FocusStats,
    LogFocusSession, StartFocusSession, StatsQuery,
};
use crate::server::AppState;
use crate::services::focus_service::FocusSessionState;

/// Create focus session API routes
pub fn create_focus_session_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_sessions).post(start_session))
        .route("/current", get(current_session))
        .route("/log", post(log_session))
        .route("/stats", get(session_stats))
        .route("/:id", get(get_session).delete(delete_session))
        .route("/:id/complete", post(complete_session))
        .route("/:id/abandon", post(abandon_session))
}

/// Start a session
pub async fn start_session(
    State(state): State<AppState>,
    user: AuthUser,
    OptionalJson(request): OptionalJson<StartFocusSession>,
) -> AppResult<(StatusCode, Json<FocusSession>)> {
    debug!("POST /api/focus-sessions - Starting {:?}", request.kind);
    let session = state.focus.start(user.id(), request).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// The running session, or `null`
pub async fn current_session(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<Option<FocusSessionState>>> {
    Ok(Json(state.focus.current(user.id()).await?))
}

pub async fn complete_session(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    OptionalJson(request): OptionalJson<CompleteFocusSession>,
) -> AppResult<Json<FocusSessionCompletion>> {
    Ok(Json(state.focus.complete(user.id(), &id, request).await?))
}

pub async fn abandon_session(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<FocusSession>> {
    Ok(Json(state.focus.abandon(user.id(), &id).await?))
}

/// Record a session that already happened
pub async fn log_session(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<LogFocusSession>,
) -> AppResult<(StatusCode, Json<FocusSession>)> {
    let session = state.focus.log(user.id(), request).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn list_sessions(
    State(state): State<AppState>,
    user: AuthUser,
    Query(filter): Query<FocusSessionFilter>,
) -> AppResult<Json<Vec<FocusSession>>> {
    Ok(Json(state.focus.list(user.id(), filter).await?))
}

pub async fn get_session(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<FocusSession>> {
    Ok(Json(state.focus.get(user.id(), &id).await?))
}

pub async fn delete_session(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.focus.delete(user.id(), &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Daily statistics, `?days=N` (1-90, default 7)
pub async fn session_stats(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<StatsQuery>,
) -> AppResult<Json<FocusStats>> {
    Ok(Json(state.focus.stats(user.id(), query).await?))
}
