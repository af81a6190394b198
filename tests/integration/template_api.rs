//! Task Template API Integration Tests

use axum::http::StatusCode;
use serde_json::{json, Value};

use crate::common::spawn_app;

#[tokio::test]
async fn test_template_crud() {
    let app = spawn_app().await;
    let token = app.login_as("sam").await;

    let template = app
        .create(
            "/api/templates",
            &token,
            json!({ "name": "Inbox zero", "title": "Clear email inbox", "estimated_minutes": 25 }),
        )
        .await;
    assert_eq!(template["priority"], "medium");

    let duplicate = app
        .post("/api/templates", &token)
        .json(&json!({ "name": "inbox ZERO", "title": "Other" }))
        .await;
    assert_eq!(duplicate.status_code(), StatusCode::CONFLICT);

    let path = format!("/api/templates/{}", template["id"].as_str().unwrap());
    let updated: Value = app
        .patch(&path, &token)
        .json(&json!({ "priority": "high", "estimated_minutes": null }))
        .await
        .json();
    assert_eq!(updated["priority"], "high");
    assert!(updated["estimated_minutes"].is_null());

    let listed: Value = app.get("/api/templates", &token).await.json();
    assert_eq!(listed.as_array().unwrap().len(), 1);

    assert_eq!(app.delete(&path, &token).await.status_code(), StatusCode::NO_CONTENT);
    assert_eq!(app.get(&path, &token).await.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_instantiate_with_overrides() {
    let app = spawn_app().await;
    let token = app.login_as("sam").await;

    let category = app.create("/api/categories", &token, json!({ "name": "Admin" })).await;
    let template = app
        .create(
            "/api/templates",
            &token,
            json!({
                "name": "Pay rent",
                "title": "Pay rent",
                "priority": "urgent",
                "category_id": category["id"],
                "recurrence": { "frequency": "monthly", "day_of_month": 1 }
            }),
        )
        .await;
    let path = format!("/api/templates/{}/instantiate", template["id"].as_str().unwrap());

    // A recurring template needs a due date for its first task.
    let missing_due = app.post(&path, &token).await;
    assert_eq!(missing_due.status_code(), StatusCode::BAD_REQUEST);

    let task = app
        .create(
            &path,
            &token,
            json!({ "title": "Pay April rent", "due_date": "2025-04-01T09:00:00Z" }),
        )
        .await;
    assert_eq!(task["title"], "Pay April rent");
    assert_eq!(task["priority"], "urgent");
    assert_eq!(task["category_id"], category["id"]);
    assert_eq!(task["recurrence"]["frequency"], "monthly");

    let completion: Value = app
        .post(&format!("/api/tasks/{}/complete", task["id"].as_str().unwrap()), &token)
        .await
        .json();
    assert!(completion["next_task"]["due_date"]
        .as_str()
        .unwrap()
        .starts_with("2025-05-01T09:00:00"));
}

#[tokio::test]
async fn test_template_category_must_be_owned() {
    let app = spawn_app().await;
    let sam = app.login_as("sam").await;
    let alex = app.login_as("alex").await;

    let category = app.create("/api/categories", &alex, json!({ "name": "Alex only" })).await;
    let response = app
        .post("/api/templates", &sam)
        .json(&json!({ "name": "Sneaky", "title": "Sneaky", "category_id": category["id"] }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_instantiate_rejects_malformed_overrides() {
    let app = spawn_app().await;
    let token = app.login_as("sam").await;

    let template = app
        .create(
            "/api/templates",
            &token,
            json!({ "name": "Inbox zero", "title": "Clear the inbox" }),
        )
        .await;
    let path = format!("/api/templates/{}/instantiate", template["id"].as_str().unwrap());

    let response = app
        .post(&path, &token)
        .json(&json!({ "due_date": "next tuesday" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let tasks: Value = app.get("/api/tasks", &token).await.json();
    assert!(tasks.as_array().unwrap().is_empty());

    let task = app.create(&path, &token, json!({})).await;
    assert_eq!(task["title"], "Clear the inbox");
}
