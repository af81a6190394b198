//! AI API Integration Tests

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use momentum::services::ai_service::{AiError, AiResponse, TextCompletionProvider};
use serde_json::{json, Value};

use crate::common::{spawn_app, spawn_app_with};

#[derive(Debug)]
struct StepsProvider;

#[async_trait]
impl TextCompletionProvider for StepsProvider {
    fn model(&self) -> &str {
        "steps-model"
    }

    async fn complete(&self, _system: &str, message: &str) -> Result<AiResponse, AiError> {
        Ok(AiResponse {
            text: format!("1. Start with: {}", message),
            model: self.model().to_string(),
            input_tokens: 42,
            output_tokens: 7,
        })
    }
}

#[derive(Debug)]
struct FailingProvider;

#[async_trait]
impl TextCompletionProvider for FailingProvider {
    fn model(&self) -> &str {
        "failing-model"
    }

    async fn complete(&self, _system: &str, _message: &str) -> Result<AiResponse, AiError> {
        Err(AiError::Provider("overloaded".to_string()))
    }
}

#[tokio::test]
async fn test_unconfigured_provider_is_unavailable() {
    let app = spawn_app().await;
    let token = app.login_as("sam").await;

    let response = app
        .post("/api/ai/complete", &token)
        .json(&json!({ "prompt": "Plan my day" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_completion_through_provider() {
    let app = spawn_app_with(Some(Arc::new(StepsProvider))).await;
    let token = app.login_as("sam").await;

    let response = app
        .post("/api/ai/complete", &token)
        .json(&json!({ "prompt": "Clean the garage", "mode": "breakdown" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body: Value = response.json();
    assert_eq!(body["text"], "1. Start with: Clean the garage");
    assert_eq!(body["model"], "steps-model");
    assert_eq!(body["output_tokens"], 7);

    let empty = app
        .post("/api/ai/complete", &token)
        .json(&json!({ "prompt": "" }))
        .await;
    assert_eq!(empty.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_disabled_in_settings_is_forbidden() {
    let app = spawn_app_with(Some(Arc::new(StepsProvider))).await;
    let token = app.login_as("sam").await;

    app.patch("/api/settings", &token)
        .json(&json!({ "ai_assist_enabled": false }))
        .await;

    let response = app
        .post("/api/ai/complete", &token)
        .json(&json!({ "prompt": "Plan my day" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_provider_failure_is_bad_gateway() {
    let app = spawn_app_with(Some(Arc::new(FailingProvider))).await;
    let token = app.login_as("sam").await;

    let response = app
        .post("/api/ai/complete", &token)
        .json(&json!({ "prompt": "Plan my day", "mode": "rephrase" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_GATEWAY);
    assert_eq!(response.json::<Value>()["error"], "AiProviderError");
}
