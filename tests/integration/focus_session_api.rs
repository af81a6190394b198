//! Focus Session API Integration Tests

use axum::http::StatusCode;
use serde_json::{json, Value};

use crate::common::spawn_app;

#[tokio::test]
async fn test_full_work_session() {
    let app = spawn_app().await;
    let token = app.login_as("sam").await;
    let task = app.create("/api/tasks", &token, json!({ "title": "Write essay" })).await;

    let session = app
        .create(
            "/api/focus-sessions",
            &token,
            json!({ "task_id": task["id"], "kind": "work", "emotion_before": "anxious" }),
        )
        .await;
    assert_eq!(session["status"], "running");
    assert_eq!(session["planned_seconds"], 1500);

    let second = app.post("/api/focus-sessions", &token).json(&json!({})).await;
    assert_eq!(second.status_code(), StatusCode::CONFLICT);

    app.time.advance_minutes(10);
    let current: Value = app.get("/api/focus-sessions/current", &token).await.json();
    assert_eq!(current["id"], session["id"]);
    assert_eq!(current["elapsed_seconds"], 600);
    assert_eq!(current["remaining_seconds"], 900);

    app.time.advance_minutes(15);
    let id = session["id"].as_str().unwrap();
    let completion: Value = app
        .post(&format!("/api/focus-sessions/{}/complete", id), &token)
        .json(&json!({ "emotion_after": "focused", "interruptions": 2, "notes": "Good flow" }))
        .await
        .json();
    assert_eq!(completion["session"]["status"], "completed");
    assert_eq!(completion["session"]["actual_seconds"], 1500);
    assert_eq!(completion["session"]["interruptions"], 2);
    assert_eq!(completion["next_kind"], "short_break");

    let current: Value = app.get("/api/focus-sessions/current", &token).await.json();
    assert!(current.is_null());

    let again = app
        .post(&format!("/api/focus-sessions/{}/complete", id), &token)
        .await;
    assert_eq!(again.status_code(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_planned_duration_follows_settings() {
    let app = spawn_app().await;
    let token = app.login_as("sam").await;

    app.patch("/api/settings", &token)
        .json(&json!({ "short_break_duration": 420 }))
        .await;

    let session = app
        .create("/api/focus-sessions", &token, json!({ "kind": "short_break" }))
        .await;
    assert_eq!(session["planned_seconds"], 420);

    let abandoned = app
        .post(&format!("/api/focus-sessions/{}/abandon", session["id"].as_str().unwrap()), &token)
        .await;
    assert_eq!(abandoned.status_code(), StatusCode::OK);

    let too_long = app
        .post("/api/focus-sessions", &token)
        .json(&json!({ "planned_seconds": 7201 }))
        .await;
    assert_eq!(too_long.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_abandon_records_elapsed_time() {
    let app = spawn_app().await;
    let token = app.login_as("sam").await;

    let session = app.create("/api/focus-sessions", &token, json!({})).await;
    app.time.advance_minutes(4);

    let abandoned: Value = app
        .post(&format!("/api/focus-sessions/{}/abandon", session["id"].as_str().unwrap()), &token)
        .await
        .json();
    assert_eq!(abandoned["status"], "abandoned");
    assert_eq!(abandoned["actual_seconds"], 240);
}

#[tokio::test]
async fn test_log_list_and_delete() {
    let app = spawn_app().await;
    let token = app.login_as("sam").await;

    let future = app
        .post("/api/focus-sessions/log", &token)
        .json(&json!({ "started_at": "2025-03-10T08:50:00Z", "actual_seconds": 1200 }))
        .await;
    assert_eq!(future.status_code(), StatusCode::BAD_REQUEST);

    let first = app
        .create(
            "/api/focus-sessions/log",
            &token,
            json!({ "started_at": "2025-03-08T10:00:00Z", "actual_seconds": 1800 }),
        )
        .await;
    app.create(
        "/api/focus-sessions/log",
        &token,
        json!({ "started_at": "2025-03-09T10:00:00Z", "actual_seconds": 900, "kind": "long_break" }),
    )
    .await;

    let listed: Value = app.get("/api/focus-sessions", &token).await.json();
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0]["kind"], "long_break");

    let from: Value = app
        .get("/api/focus-sessions?from=2025-03-09T00:00:00Z", &token)
        .await
        .json();
    assert_eq!(from.as_array().unwrap().len(), 1);

    let path = format!("/api/focus-sessions/{}", first["id"].as_str().unwrap());
    assert_eq!(app.delete(&path, &token).await.status_code(), StatusCode::NO_CONTENT);
    assert_eq!(app.get(&path, &token).await.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_stats_by_local_day() {
    let app = spawn_app().await;
    let token = app.login_as("sam").await;

    app.patch("/api/settings", &token)
        .json(&json!({ "timezone": "America/New_York", "daily_focus_goal_minutes": 30 }))
        .await;

    // 2025-03-10 02:00 UTC is still 2025-03-09 in New York.
    for (started_at, seconds, before, after) in [
        ("2025-03-08T15:00:00Z", 1800, "tired", "calm"),
        ("2025-03-10T02:00:00Z", 1500, "anxious", "calm"),
        ("2025-03-10T08:00:00Z", 600, "anxious", "focused"),
    ] {
        app.create(
            "/api/focus-sessions/log",
            &token,
            json!({
                "started_at": started_at,
                "actual_seconds": seconds,
                "emotion_before": before,
                "emotion_after": after
            }),
        )
        .await;
    }

    let stats: Value = app.get("/api/focus-sessions/stats?days=3", &token).await.json();
    assert_eq!(stats["timezone"], "America/New_York");

    let days = stats["days"].as_array().unwrap();
    assert_eq!(days.len(), 3);
    assert_eq!(days[0]["date"], "2025-03-08");
    assert_eq!(days[0]["work_seconds"], 1800);
    assert_eq!(days[0]["goal_met"], true);
    assert_eq!(days[1]["work_seconds"], 1500);
    assert_eq!(days[1]["goal_met"], false);
    assert_eq!(days[2]["work_seconds"], 600);

    assert_eq!(stats["total_sessions"], 3);
    assert_eq!(stats["current_streak_days"], 3);

    let emotions = stats["emotions"].as_array().unwrap();
    let anxious = emotions.iter().find(|e| e["emotion"] == "anxious").unwrap();
    assert_eq!(anxious["before"], 2);
    let calm = emotions.iter().find(|e| e["emotion"] == "calm").unwrap();
    assert_eq!(calm["after"], 2);

    let invalid = app.get("/api/focus-sessions/stats?days=0", &token).await;
    assert_eq!(invalid.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_bodies_are_rejected() {
    let app = spawn_app().await;
    let token = app.login_as("sam").await;

    let start = app
        .post("/api/focus-sessions", &token)
        .json(&json!({ "kind": "nap", "planned_seconds": "lots" }))
        .await;
    assert_eq!(start.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(start.json::<Value>()["error"], "ValidationError");
    let current: Value = app.get("/api/focus-sessions/current", &token).await.json();
    assert!(current.is_null());

    // An empty object still starts a default session.
    let session = app.create("/api/focus-sessions", &token, json!({})).await;
    let complete = app
        .post(&format!("/api/focus-sessions/{}/complete", session["id"].as_str().unwrap()), &token)
        .json(&json!({ "interruptions": "several" }))
        .await;
    assert_eq!(complete.status_code(), StatusCode::BAD_REQUEST);

    let still_running: Value = app.get("/api/focus-sessions/current", &token).await.json();
    assert_eq!(still_running["id"], session["id"]);
}
