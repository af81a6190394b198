//! Project API endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};

use crate::api::auth::AuthUser;
use crate::error::AppResult;
use crate::models::project::{CreateProject, Project, UpdateProject};
use crate::server::AppState;
use crate::services::project_service::ProjectListQuery;

/// Create project API routes
pub fn create_project_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_projects).post(create_project))
        .route(
            "/:id",
            get(get_project).patch(update_project).delete(delete_project),
        )
}

/// List projects, `?include_archived=true` to include archived ones
pub async fn list_projects(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ProjectListQuery>,
) -> AppResult<Json<Vec<Project>>> {
    Ok(Json(state.projects.list(user.id(), query.include_archived).await?))
}

pub async fn get_project(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<Project>> {
    Ok(Json(state.projects.get(user.id(), &id).await?))
}

pub async fn create_project(
    State(state): State<AppState>,
    user: AuthUser,
    Json(create): Json<CreateProject>,
) -> AppResult<(StatusCode, Json<Project>)> {
    let project = state.projects.create(user.id(), create).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn update_project(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(update): Json<UpdateProject>,
) -> AppResult<Json<Project>> {
    Ok(Json(state.projects.update(user.id(), &id, update).await?))
}

pub async fn delete_project(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.projects.delete(user.id(), &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
