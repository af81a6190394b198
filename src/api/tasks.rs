//! Task API endpoints
//!
//! CRUD with list filters, plus completion (which may create the next
//! instance of a recurring task) and reopening.

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
use crate::models::task::{CompleteTask, CreateTask, Task, TaskCompletion, TaskFilter, UpdateTask};
use crate::server::AppState;

/// Create task API routes
pub fn create_task_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tasks).post(create_task))
        .route("/:id", get(get_task).patch(update_task).delete(delete_task))
        .route("/:id/complete", post(complete_task))
        .route("/:id/reopen", post(reopen_task))
}

/// List tasks matching the query filters
pub async fn list_tasks(
    State(state): State<AppState>,
    user: AuthUser,
    Query(filter): Query<TaskFilter>,
) -> AppResult<Json<Vec<Task>>> {
    debug!("GET /api/tasks - Listing tasks with {:?}", filter);
    Ok(Json(state.tasks.list(user.id(), filter).await?))
}

pub async fn get_task(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<Task>> {
    Ok(Json(state.tasks.get(user.id(), &id).await?))
}

pub async fn create_task(
    State(state): State<AppState>,
    user: AuthUser,
    Json(create): Json<CreateTask>,
) -> AppResult<(StatusCode, Json<Task>)> {
    let task = state.tasks.create(user.id(), create).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn update_task(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(update): Json<UpdateTask>,
) -> AppResult<Json<Task>> {
    Ok(Json(state.tasks.update(user.id(), &id, update).await?))
}

pub async fn delete_task(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.tasks.delete(user.id(), &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Mark a task done. The body is optional.
pub async fn complete_task(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    OptionalJson(request): OptionalJson<CompleteTask>,
) -> AppResult<Json<TaskCompletion>> {
    Ok(Json(state.tasks.complete(user.id(), &id, request).await?))
}

pub async fn reopen_task(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<Task>> {
    Ok(Json(state.tasks.reopen(user.id(), &id).await?))
}
