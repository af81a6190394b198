//! Task API Integration Tests

use axum::http::StatusCode;
use serde_json::{json, Value};

use crate::common::{spawn_app, TestApp};

fn titles(tasks: &Value) -> Vec<&str> {
    tasks
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn test_create_and_get_task() {
    let app = spawn_app().await;
    let token = app.login_as("sam").await;

    let task = app
        .create(
            "/api/tasks",
            &token,
            json!({ "title": "  Call the bank  ", "priority": "high", "estimated_minutes": 15 }),
        )
        .await;
    assert_eq!(task["title"], "Call the bank");
    assert_eq!(task["status"], "todo");
    assert_eq!(task["priority"], "high");

    let id = task["id"].as_str().unwrap();
    let fetched: Value = app.get(&format!("/api/tasks/{}", id), &token).await.json();
    assert_eq!(fetched["id"], task["id"]);
}

#[tokio::test]
async fn test_task_validation() {
    let app = spawn_app().await;
    let token = app.login_as("sam").await;

    for body in [
        json!({ "title": "   " }),
        json!({ "title": "x".repeat(201) }),
        json!({ "title": "Nap", "estimated_minutes": 0 }),
        json!({ "title": "Nap", "recurrence": { "frequency": "daily" } }),
        json!({ "title": "Nap", "category_id": "missing" }),
    ] {
        let response = app.post("/api/tasks", &token).json(&body).await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST, "{}", body);
    }
}

#[tokio::test]
async fn test_tasks_are_private() {
    let app = spawn_app().await;
    let sam = app.login_as("sam").await;
    let alex = app.login_as("alex").await;

    let task = app.create("/api/tasks", &sam, json!({ "title": "Secret" })).await;
    let path = format!("/api/tasks/{}", task["id"].as_str().unwrap());

    assert_eq!(app.get(&path, &alex).await.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(app.delete(&path, &alex).await.status_code(), StatusCode::NOT_FOUND);
    assert!(app.get("/api/tasks", &alex).await.json::<Value>().as_array().unwrap().is_empty());

    let category = app.create("/api/categories", &alex, json!({ "name": "Mine" })).await;
    let response = app
        .post("/api/tasks", &sam)
        .json(&json!({ "title": "Borrowed", "category_id": category["id"] }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_order_and_filters() {
    let app = spawn_app().await;
    let token = app.login_as("sam").await;

    app.create("/api/tasks", &token, json!({ "title": "No due date", "priority": "urgent" }))
        .await;
    app.create(
        "/api/tasks",
        &token,
        json!({ "title": "Later low", "priority": "low", "due_date": "2025-03-12T10:00:00Z" }),
    )
    .await;
    app.create(
        "/api/tasks",
        &token,
        json!({ "title": "Later urgent", "priority": "urgent", "due_date": "2025-03-12T10:00:00Z" }),
    )
    .await;
    app.create(
        "/api/tasks",
        &token,
        json!({ "title": "Overdue report", "due_date": "2025-03-09T10:00:00Z" }),
    )
    .await;

    let all: Value = app.get("/api/tasks", &token).await.json();
    assert_eq!(
        titles(&all),
        vec!["Overdue report", "Later urgent", "Later low", "No due date"]
    );

    let overdue: Value = app.get("/api/tasks?overdue=true", &token).await.json();
    assert_eq!(titles(&overdue), vec!["Overdue report"]);

    let urgent: Value = app.get("/api/tasks?priority=urgent", &token).await.json();
    assert_eq!(titles(&urgent), vec!["Later urgent", "No due date"]);

    let search: Value = app.get("/api/tasks?q=LATER", &token).await.json();
    assert_eq!(titles(&search).len(), 2);

    let before: Value = app
        .get("/api/tasks?due_before=2025-03-11T00:00:00Z", &token)
        .await
        .json();
    assert_eq!(titles(&before), vec!["Overdue report"]);
}

#[tokio::test]
async fn test_status_changes_track_completed_at() {
    let app = spawn_app().await;
    let token = app.login_as("sam").await;

    let task = app.create("/api/tasks", &token, json!({ "title": "Laundry" })).await;
    let path = format!("/api/tasks/{}", task["id"].as_str().unwrap());

    let done: Value = app.patch(&path, &token).json(&json!({ "status": "done" })).await.json();
    assert!(done["completed_at"].is_string());

    let back: Value = app
        .patch(&path, &token)
        .json(&json!({ "status": "in_progress" }))
        .await
        .json();
    assert!(back["completed_at"].is_null());
}

#[tokio::test]
async fn test_complete_recurring_task_creates_next_instance() {
    let app = spawn_app().await;
    let token = app.login_as("sam").await;

    let task = app
        .create(
            "/api/tasks",
            &token,
            json!({
                "title": "Take vitamins",
                "due_date": "2025-03-10T08:00:00Z",
                "recurrence": { "frequency": "daily", "interval": 2, "count": 2 }
            }),
        )
        .await;
    let id = task["id"].as_str().unwrap();

    let response = app
        .post(&format!("/api/tasks/{}/complete", id), &token)
        .json(&json!({ "emotion": "energized" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let completion: Value = response.json();

    assert_eq!(completion["task"]["status"], "done");
    assert_eq!(completion["task"]["emotion"], "energized");
    let next = &completion["next_task"];
    assert_eq!(next["status"], "todo");
    assert_eq!(next["recurrence_parent_id"], task["id"]);
    assert_eq!(next["occurrence_index"], 1);
    assert!(next["due_date"].as_str().unwrap().starts_with("2025-03-12T08:00:00"));

    // Completing twice is a conflict.
    let again = app.post(&format!("/api/tasks/{}/complete", id), &token).await;
    assert_eq!(again.status_code(), StatusCode::CONFLICT);

    // The series has two occurrences, so the second instance is the last.
    let next_id = next["id"].as_str().unwrap();
    let last: Value = app
        .post(&format!("/api/tasks/{}/complete", next_id), &token)
        .await
        .json();
    assert!(last["next_task"].is_null());
}

#[tokio::test]
async fn test_reopen_and_delete() {
    let app = spawn_app().await;
    let token = app.login_as("sam").await;

    let task = app.create("/api/tasks", &token, json!({ "title": "Reply to Jo" })).await;
    let path = format!("/api/tasks/{}", task["id"].as_str().unwrap());

    let reopen = app.post(&format!("{}/reopen", path), &token).await;
    assert_eq!(reopen.status_code(), StatusCode::CONFLICT);

    app.post(&format!("{}/complete", path), &token).await;
    let reopened: Value = app.post(&format!("{}/reopen", path), &token).await.json();
    assert_eq!(reopened["status"], "todo");
    assert!(reopened["completed_at"].is_null());

    assert_eq!(app.delete(&path, &token).await.status_code(), StatusCode::NO_CONTENT);
    assert_eq!(app.get(&path, &token).await.status_code(), StatusCode::NOT_FOUND);
}

/// Complete `id` and return the instance that follows it
async fn complete_and_next(app: &TestApp, token: &str, id: &str) -> Value {
    let response = app.post(&format!("/api/tasks/{}/complete", id), token).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    response.json::<Value>()["next_task"].clone()
}

#[tokio::test]
async fn test_recompleting_after_reopen_keeps_one_next_instance() {
    let app = spawn_app().await;
    let token = app.login_as("sam").await;

    let task = app
        .create(
            "/api/tasks",
            &token,
            json!({
                "title": "Feed the cat",
                "due_date": "2025-03-10T07:00:00Z",
                "recurrence": { "frequency": "daily" }
            }),
        )
        .await;
    let id = task["id"].as_str().unwrap();

    let first = complete_and_next(&app, &token, id).await;
    app.post(&format!("/api/tasks/{}/reopen", id), &token).await;
    let second = complete_and_next(&app, &token, id).await;
    assert_eq!(first["id"], second["id"]);

    let tomorrow: Value = app
        .get(
            "/api/tasks?due_after=2025-03-11T00:00:00Z&due_before=2025-03-12T00:00:00Z",
            &token,
        )
        .await
        .json();
    assert_eq!(tomorrow.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_monthly_series_on_the_31st() {
    let app = spawn_app().await;
    let token = app.login_as("sam").await;

    let task = app
        .create(
            "/api/tasks",
            &token,
            json!({
                "title": "Pay credit card",
                "due_date": "2025-01-31T10:00:00Z",
                "recurrence": { "frequency": "monthly" }
            }),
        )
        .await;

    let february = complete_and_next(&app, &token, task["id"].as_str().unwrap()).await;
    assert!(february["due_date"].as_str().unwrap().starts_with("2025-02-28T10:00:00"));

    let march = complete_and_next(&app, &token, february["id"].as_str().unwrap()).await;
    assert!(march["due_date"].as_str().unwrap().starts_with("2025-03-31T10:00:00"));
    assert_eq!(march["recurrence_parent_id"], task["id"]);
}

#[tokio::test]
async fn test_yearly_series_on_leap_day() {
    let app = spawn_app().await;
    let token = app.login_as("sam").await;

    let task = app
        .create(
            "/api/tasks",
            &token,
            json!({
                "title": "Birthday card for Leo",
                "due_date": "2024-02-29T09:00:00Z",
                "recurrence": { "frequency": "yearly" }
            }),
        )
        .await;

    let next = complete_and_next(&app, &token, task["id"].as_str().unwrap()).await;
    assert!(next["due_date"].as_str().unwrap().starts_with("2025-02-28T09:00:00"));
    assert_eq!(next["occurrence_index"], 1);
}

#[tokio::test]
async fn test_complete_rejects_malformed_body() {
    let app = spawn_app().await;
    let token = app.login_as("sam").await;

    let task = app.create("/api/tasks", &token, json!({ "title": "Dishes" })).await;
    let path = format!("/api/tasks/{}", task["id"].as_str().unwrap());

    let response = app
        .post(&format!("{}/complete", path), &token)
        .json(&json!({ "emotion": "happy" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"], "ValidationError");

    let unchanged: Value = app.get(&path, &token).await.json();
    assert_eq!(unchanged["status"], "todo");
}
