//! Shared setup for API integration tests

use std::sync::Arc;

use axum::http::{header, HeaderValue, StatusCode};
use axum_test::{TestRequest, TestServer};
use chrono::{DateTime, TimeZone, Utc};
use momentum::config::Config;
use momentum::database::DatabaseManager;
use momentum::server::{create_app, AppState};
use momentum::services::{MockTimeProvider, TextCompletionProvider};
use serde_json::{json, Value};

/// 2025-03-10 09:00 UTC, a Monday
pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap()
}

pub struct TestApp {
    pub server: TestServer,
    pub time: MockTimeProvider,
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(None).await
}

pub async fn spawn_app_with(provider: Option<Arc<dyn TextCompletionProvider>>) -> TestApp {
    let db = DatabaseManager::in_memory().await.unwrap();
    let time = MockTimeProvider::new(start_time());
    let state = AppState::new(Config::for_test(), db, Arc::new(time.clone()), provider);
    let server = TestServer::new(create_app(state)).unwrap();
    TestApp { server, time }
}

fn bearer(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {}", token)).unwrap()
}

impl TestApp {
    /// Register `username` and return a bearer token for it
    pub async fn login_as(&self, username: &str) -> String {
        let credentials = json!({ "username": username, "password": "correct-horse" });

        let response = self.server.post("/api/auth/register").json(&credentials).await;
        assert_eq!(response.status_code(), StatusCode::CREATED);

        let response = self.server.post("/api/auth/login").json(&credentials).await;
        assert_eq!(response.status_code(), StatusCode::OK);
        response.json::<Value>()["token"].as_str().unwrap().to_string()
    }

    pub fn get(&self, path: &str, token: &str) -> TestRequest {
        self.server.get(path).add_header(header::AUTHORIZATION, bearer(token))
    }

    pub fn post(&self, path: &str, token: &str) -> TestRequest {
        self.server.post(path).add_header(header::AUTHORIZATION, bearer(token))
    }

    pub fn patch(&self, path: &str, token: &str) -> TestRequest {
        self.server.patch(path).add_header(header::AUTHORIZATION, bearer(token))
    }

    pub fn put(&self, path: &str, token: &str) -> TestRequest {
        self.server.put(path).add_header(header::AUTHORIZATION, bearer(token))
    }

    pub fn delete(&self, path: &str, token: &str) -> TestRequest {
        self.server.delete(path).add_header(header::AUTHORIZATION, bearer(token))
    }

    /// Create a resource and return its JSON body
    pub async fn create(&self, path: &str, token: &str, body: Value) -> Value {
        let response = self.post(path, token).json(&body).await;
        assert_eq!(
            response.status_code(),
            StatusCode::CREATED,
            "POST {} failed: {}",
            path,
            response.text()
        );
        response.json()
    }
}
