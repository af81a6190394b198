//! Task template API endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};

use crate::api::auth::AuthUser;
use crate::api::extract::OptionalJson;
use crate::error::AppResult;
use crate::models::task::Task;
use crate::models::template::{CreateTemplate, InstantiateTemplate, TaskTemplate, UpdateTemplate};
use crate::server::AppState;

/// Create template API routes
pub fn create_template_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_templates).post(create_template))
        .route(
            "/:id",
            get(get_template).patch(update_template).delete(delete_template),
        )
        .route("/:id/instantiate", post(instantiate_template))
}

pub async fn list_templates(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<Vec<TaskTemplate>>> {
    Ok(Json(state.templates.list(user.id()).await?))
}

pub async fn get_template(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<TaskTemplate>> {
    Ok(Json(state.templates.get(user.id(), &id).await?))
}

pub async fn create_template(
    State(state): State<AppState>,
    user: AuthUser,
    Json(create): Json<CreateTemplate>,
) -> AppResult<(StatusCode, Json<TaskTemplate>)> {
    let template = state.templates.create(user.id(), create).await?;
    Ok((StatusCode::CREATED, Json(template)))
}

pub async fn update_template(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(update): Json<UpdateTemplate>,
) -> AppResult<Json<TaskTemplate>> {
    Ok(Json(state.templates.update(user.id(), &id, update).await?))
}

pub async fn delete_template(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.templates.delete(user.id(), &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Create a task from a template. Overrides are optional.
pub async fn instantiate_template(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    OptionalJson(overrides): OptionalJson<InstantiateTemplate>,
) -> AppResult<(StatusCode, Json<Task>)> {
    let task = state.templates.instantiate(user.id(), &id, overrides).await?;
    Ok((StatusCode::CREATED, Json(task)))
}
