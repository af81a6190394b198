//! Recurrence preview endpoint

use axum::{response::Json, routing::post, Router};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::api::auth::AuthUser;
use crate::error::AppResult;
use crate::models::recurrence::{RecurrenceRule, DEFAULT_PREVIEW};
use crate::server::AppState;

#[derive(Debug, Clone, Deserialize)]
pub struct PreviewRequest {
    pub rule: RecurrenceRule,
    pub start: NaiveDate,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewResponse {
    pub dates: Vec<NaiveDate>,
}

/// Create recurrence API routes
pub fn create_recurrence_routes() -> Router<AppState> {
    Router::new().route("/preview", post(preview))
}

/// Upcoming dates of a rule, without creating anything
pub async fn preview(
    _user: AuthUser,
    Json(request): Json<PreviewRequest>,
) -> AppResult<Json<PreviewResponse>> {
    let dates = request
        .rule
        .preview(request.start, request.limit.unwrap_or(DEFAULT_PREVIEW))?;
    Ok(Json(PreviewResponse { dates }))
}
