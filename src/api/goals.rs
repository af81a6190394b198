//! Goal API endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};

use crate::api::auth::AuthUser;
use crate::error::AppResult;
use crate::models::goal::{CreateGoal, GoalWithProgress, UpdateGoal};
use crate::server::AppState;

/// Create goal API routes
pub fn create_goal_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_goals).post(create_goal))
        .route("/:id", get(get_goal).patch(update_goal).delete(delete_goal))
}

pub async fn list_goals(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<Vec<GoalWithProgress>>> {
    Ok(Json(state.goals.list(user.id()).await?))
}

pub async fn get_goal(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<GoalWithProgress>> {
    Ok(Json(state.goals.get(user.id(), &id).await?))
}

pub async fn create_goal(
    State(state): State<AppState>,
    user: AuthUser,
    Json(create): Json<CreateGoal>,
) -> AppResult<(StatusCode, Json<GoalWithProgress>)> {
    let goal = state.goals.create(user.id(), create).await?;
    Ok((StatusCode::CREATED, Json(goal)))
}

pub async fn update_goal(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(update): Json<UpdateGoal>,
) -> AppResult<Json<GoalWithProgress>> {
    Ok(Json(state.goals.update(user.id(), &id, update).await?))
}

pub async fn delete_goal(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.goals.delete(user.id(), &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
