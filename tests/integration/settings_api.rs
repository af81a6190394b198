//! Settings API Integration Tests

use axum::http::StatusCode;
use serde_json::{json, Value};

use crate::common::spawn_app;

#[tokio::test]
async fn test_defaults_created_on_register() {
    let app = spawn_app().await;
    let token = app.login_as("sam").await;

    let response = app.get("/api/settings", &token).await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let settings: Value = response.json();
    assert_eq!(settings["focus_duration"], 1500);
    assert_eq!(settings["short_break_duration"], 300);
    assert_eq!(settings["long_break_duration"], 900);
    assert_eq!(settings["long_break_frequency"], 4);
    assert_eq!(settings["daily_focus_goal_minutes"], 120);
    assert_eq!(settings["theme"], "system");
    assert_eq!(settings["timezone"], "UTC");
    assert_eq!(settings["ai_assist_enabled"], true);
}

#[tokio::test]
async fn test_partial_update() {
    let app = spawn_app().await;
    let token = app.login_as("sam").await;

    let updated: Value = app
        .patch("/api/settings", &token)
        .json(&json!({ "focus_duration": 3000, "theme": "dark", "focus_sound": "rain" }))
        .await
        .json();
    assert_eq!(updated["focus_duration"], 3000);
    assert_eq!(updated["theme"], "dark");
    assert_eq!(updated["focus_sound"], "rain");
    assert_eq!(updated["short_break_duration"], 300);

    let cleared: Value = app
        .put("/api/settings", &token)
        .json(&json!({ "focus_sound": null }))
        .await
        .json();
    assert!(cleared["focus_sound"].is_null());
    assert_eq!(cleared["theme"], "dark");
}

#[tokio::test]
async fn test_validation_errors_carry_field_details() {
    let app = spawn_app().await;
    let token = app.login_as("sam").await;

    let response = app
        .patch("/api/settings", &token)
        .json(&json!({ "theme": "light", "long_break_frequency": 1 }))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = response.json();
    assert_eq!(body["error"], "ValidationError");
    assert_eq!(body["details"][0]["field"], "long_break_frequency");

    // Nothing was applied.
    let settings: Value = app.get("/api/settings", &token).await.json();
    assert_eq!(settings["theme"], "system");

    let response = app
        .patch("/api/settings", &token)
        .json(&json!({ "timezone": "Mars/Olympus" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.json::<Value>()["details"][0]["field"], "timezone");
}

#[tokio::test]
async fn test_reset_to_defaults() {
    let app = spawn_app().await;
    let token = app.login_as("sam").await;

    app.patch("/api/settings", &token)
        .json(&json!({ "focus_duration": 600, "notifications_enabled": false }))
        .await;

    let reset: Value = app.post("/api/settings/reset", &token).await.json();
    assert_eq!(reset["focus_duration"], 1500);
    assert_eq!(reset["notifications_enabled"], true);
}
