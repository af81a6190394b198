//! Authentication API Integration Tests

use axum::http::{header, HeaderValue, StatusCode};
use serde_json::{json, Value};

use crate::common::spawn_app;

#[tokio::test]
async fn test_register_hides_credentials() {
    let app = spawn_app().await;

    let response = app
        .server
        .post("/api/auth/register")
        .json(&json!({ "username": "sam", "password": "long-enough" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::CREATED);
    let user: Value = response.json();
    assert_eq!(user["username"], "sam");
    assert!(user.get("password_hash").is_none());
    assert!(user.get("salt").is_none());
}

#[tokio::test]
async fn test_register_validation_and_conflict() {
    let app = spawn_app().await;
    app.login_as("sam").await;

    let duplicate = app
        .server
        .post("/api/auth/register")
        .json(&json!({ "username": "SAM", "password": "long-enough" }))
        .await;
    assert_eq!(duplicate.status_code(), StatusCode::CONFLICT);
    assert_eq!(duplicate.json::<Value>()["error"], "Conflict");

    let short_password = app
        .server
        .post("/api/auth/register")
        .json(&json!({ "username": "alex", "password": "short" }))
        .await;
    assert_eq!(short_password.status_code(), StatusCode::BAD_REQUEST);

    let bad_username = app
        .server
        .post("/api/auth/register")
        .json(&json!({ "username": "a b", "password": "long-enough" }))
        .await;
    assert_eq!(bad_username.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_rejects_wrong_password() {
    let app = spawn_app().await;
    app.login_as("sam").await;

    let response = app
        .server
        .post("/api/auth/login")
        .json(&json!({ "username": "sam", "password": "wrong-password" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["error"], "InvalidCredentials");
}

#[tokio::test]
async fn test_login_sets_http_only_cookie() {
    let app = spawn_app().await;
    app.login_as("sam").await;

    let response = app
        .server
        .post("/api/auth/login")
        .json(&json!({ "username": "sam", "password": "correct-horse" }))
        .await;
    let cookie = response.header(header::SET_COOKIE);
    let cookie = cookie.to_str().unwrap();
    assert!(cookie.starts_with("momentum_session="));
    assert!(cookie.contains("HttpOnly"));

    let token = response.json::<Value>()["token"].as_str().unwrap().to_string();
    let session = app
        .server
        .get("/api/auth/session")
        .add_header(
            header::COOKIE,
            HeaderValue::from_str(&format!("momentum_session={}", token)).unwrap(),
        )
        .await;
    assert_eq!(session.status_code(), StatusCode::OK);
    assert_eq!(session.json::<Value>()["username"], "sam");
}

#[tokio::test]
async fn test_protected_routes_require_session() {
    let app = spawn_app().await;

    assert_eq!(
        app.server.get("/api/tasks").await.status_code(),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        app.get("/api/tasks", "not-a-token").await.status_code(),
        StatusCode::UNAUTHORIZED
    );

    let health = app.server.get("/api/health").await;
    assert_eq!(health.status_code(), StatusCode::OK);
    assert_eq!(health.json::<Value>()["status"], "ok");
}

#[tokio::test]
async fn test_session_expires() {
    let app = spawn_app().await;
    let token = app.login_as("sam").await;
    assert_eq!(
        app.get("/api/auth/session", &token).await.status_code(),
        StatusCode::OK
    );

    // Default lifetime is 30 days.
    app.time.advance_days(31);
    assert_eq!(
        app.get("/api/auth/session", &token).await.status_code(),
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let app = spawn_app().await;
    let token = app.login_as("sam").await;

    let response = app.post("/api/auth/logout", &token).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let cookie = response.header(header::SET_COOKIE);
    assert!(cookie.to_str().unwrap().starts_with("momentum_session="));
}

#[tokio::test]
async fn test_logout_requires_session() {
    let app = spawn_app().await;

    let response = app.server.post("/api/auth/logout").await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["error"], "Unauthorized");
}
