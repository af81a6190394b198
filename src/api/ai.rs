//! AI completion endpoint

use axum::{extract::State, response::Json, routing::post, Router};

use crate::api::auth::AuthUser;
use crate::error::AppResult;
use crate::server::AppState;
use crate::services::ai_service::{AiRequest, AiResponse};

/// Create AI API routes
pub fn create_ai_routes() -> Router<AppState> {
    Router::new().route("/complete", post(complete))
}

pub async fn complete(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<AiRequest>,
) -> AppResult<Json<AiResponse>> {
    Ok(Json(state.ai.complete(user.id(), request).await?))
}
