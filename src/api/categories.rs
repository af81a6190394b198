//! Category API endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use tracing::debug;

use crate::api::auth::AuthUser;
use crate::error::AppResult;
use crate::models::category::{Category, CreateCategory, UpdateCategory};
use crate::server::AppState;

/// Create category API routes
pub fn create_category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route(
            "/:id",
            get(get_category).patch(update_category).delete(delete_category),
        )
}

pub async fn list_categories(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<Vec<Category>>> {
    Ok(Json(state.categories.list(user.id()).await?))
}

pub async fn get_category(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<Category>> {
    Ok(Json(state.categories.get(user.id(), &id).await?))
}

pub async fn create_category(
    State(state): State<AppState>,
    user: AuthUser,
    Json(create): Json<CreateCategory>,
) -> AppResult<(StatusCode, Json<Category>)> {
    debug!("POST /api/categories - Creating category {:?}", create.name);
    let category = state.categories.create(user.id(), create).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update_category(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(update): Json<UpdateCategory>,
) -> AppResult<Json<Category>> {
    Ok(Json(state.categories.update(user.id(), &id, update).await?))
}

pub async fn delete_category(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.categories.delete(user.id(), &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
