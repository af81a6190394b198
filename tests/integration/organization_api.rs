//! Category, project, goal and recurrence preview API Integration Tests

use axum::http::StatusCode;
use serde_json::{json, Value};

use crate::common::spawn_app;

#[tokio::test]
async fn test_category_crud() {
    let app = spawn_app().await;
    let token = app.login_as("sam").await;

    let work = app.create("/api/categories", &token, json!({ "name": "Work" })).await;
    assert_eq!(work["color"], "#6366f1");
    app.create("/api/categories", &token, json!({ "name": "errands", "color": "#22C55E" }))
        .await;

    let duplicate = app
        .post("/api/categories", &token)
        .json(&json!({ "name": "WORK" }))
        .await;
    assert_eq!(duplicate.status_code(), StatusCode::CONFLICT);

    let bad_color = app
        .post("/api/categories", &token)
        .json(&json!({ "name": "Home", "color": "green" }))
        .await;
    assert_eq!(bad_color.status_code(), StatusCode::BAD_REQUEST);

    let listed: Value = app.get("/api/categories", &token).await.json();
    let names: Vec<&str> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["errands", "Work"]);
    assert_eq!(listed[0]["color"], "#22c55e");

    let path = format!("/api/categories/{}", work["id"].as_str().unwrap());
    let renamed: Value = app
        .patch(&path, &token)
        .json(&json!({ "name": "Day job" }))
        .await
        .json();
    assert_eq!(renamed["name"], "Day job");
}

#[tokio::test]
async fn test_deleting_category_detaches_tasks() {
    let app = spawn_app().await;
    let token = app.login_as("sam").await;

    let category = app.create("/api/categories", &token, json!({ "name": "Home" })).await;
    let task = app
        .create("/api/tasks", &token, json!({ "title": "Fix tap", "category_id": category["id"] }))
        .await;

    let path = format!("/api/categories/{}", category["id"].as_str().unwrap());
    assert_eq!(app.delete(&path, &token).await.status_code(), StatusCode::NO_CONTENT);
    assert_eq!(app.delete(&path, &token).await.status_code(), StatusCode::NOT_FOUND);

    let task: Value = app
        .get(&format!("/api/tasks/{}", task["id"].as_str().unwrap()), &token)
        .await
        .json();
    assert!(task["category_id"].is_null());
}

#[tokio::test]
async fn test_archived_projects() {
    let app = spawn_app().await;
    let token = app.login_as("sam").await;

    let project = app
        .create("/api/projects", &token, json!({ "name": "Garden", "description": "Raised beds" }))
        .await;
    assert_eq!(project["archived"], false);

    let path = format!("/api/projects/{}", project["id"].as_str().unwrap());
    let archived: Value = app
        .patch(&path, &token)
        .json(&json!({ "archived": true, "description": null }))
        .await
        .json();
    assert_eq!(archived["archived"], true);
    assert!(archived["description"].is_null());

    let active: Value = app.get("/api/projects", &token).await.json();
    assert!(active.as_array().unwrap().is_empty());

    let all: Value = app.get("/api/projects?include_archived=true", &token).await.json();
    assert_eq!(all.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_goal_progress() {
    let app = spawn_app().await;
    let token = app.login_as("sam").await;

    let goal = app
        .create(
            "/api/goals",
            &token,
            json!({ "title": "Run a 5k", "target_date": "2025-06-01" }),
        )
        .await;
    assert_eq!(goal["progress"], 0);
    assert_eq!(goal["status"], "active");

    let mut first_task = None;
    for title in ["Buy shoes", "First run", "Second run"] {
        let task = app
            .create("/api/tasks", &token, json!({ "title": title, "goal_id": goal["id"] }))
            .await;
        first_task.get_or_insert(task);
    }
    let first_task = first_task.unwrap();
    app.post(&format!("/api/tasks/{}/complete", first_task["id"].as_str().unwrap()), &token)
        .await;

    let path = format!("/api/goals/{}", goal["id"].as_str().unwrap());
    let goal: Value = app.get(&path, &token).await.json();
    assert_eq!(goal["task_count"], 3);
    assert_eq!(goal["completed_task_count"], 1);
    assert_eq!(goal["progress"], 33);

    let achieved: Value = app
        .patch(&path, &token)
        .json(&json!({ "status": "achieved" }))
        .await
        .json();
    assert_eq!(achieved["status"], "achieved");
    assert_eq!(achieved["task_count"], 3);

    let empty_title = app.post("/api/goals", &token).json(&json!({ "title": "" })).await;
    assert_eq!(empty_title.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_recurrence_preview() {
    let app = spawn_app().await;
    let token = app.login_as("sam").await;

    let response = app
        .post("/api/recurrence/preview", &token)
        .json(&json!({
            "rule": { "frequency": "weekly", "days_of_week": ["tue", "fri"] },
            "start": "2025-03-05",
            "limit": 4
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let preview: Value = response.json();
    assert_eq!(
        preview["dates"],
        json!(["2025-03-07", "2025-03-11", "2025-03-14", "2025-03-18"])
    );

    let monthly: Value = app
        .post("/api/recurrence/preview", &token)
        .json(&json!({
            "rule": { "frequency": "monthly", "day_of_month": 31 },
            "start": "2025-01-31",
            "limit": 3
        }))
        .await
        .json();
    assert_eq!(monthly["dates"], json!(["2025-01-31", "2025-02-28", "2025-03-31"]));

    let invalid = app
        .post("/api/recurrence/preview", &token)
        .json(&json!({ "rule": { "frequency": "daily", "interval": 0 }, "start": "2025-03-05" }))
        .await;
    assert_eq!(invalid.status_code(), StatusCode::BAD_REQUEST);

    let too_many = app
        .post("/api/recurrence/preview", &token)
        .json(&json!({ "rule": { "frequency": "daily" }, "start": "2025-03-05", "limit": 101 }))
        .await;
    assert_eq!(too_many.status_code(), StatusCode::BAD_REQUEST);
}
