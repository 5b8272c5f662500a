#![allow(dead_code)]

use std::sync::{Arc, Once};

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use mom_care_api::api::{create_application, AppState};
use mom_care_data::database::DatabasePool;
use mom_care_data::repository::Repositories;
use mom_care_domain::config::AppConfig;
use mom_care_domain::notify::{DisabledPushNotifier, PushNotifier};

static INIT: Once = Once::new();

pub fn initialize() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("warn")
            .with_test_writer()
            .try_init();
    });
}

/// Router over a private in-memory database, plus direct repository access for fixtures
pub struct TestApp {
    pub router: Router,
    pub repos: Repositories,
    pub state: AppState,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_push(Arc::new(DisabledPushNotifier))
    }

    pub fn with_push(push: Arc<dyn PushNotifier>) -> Self {
        initialize();
        let pool = DatabasePool::in_memory().unwrap();
        let state = AppState::with_parts(AppConfig::for_testing(), pool.clone(), push, None);
        Self {
            router: create_application(state.clone()),
            repos: Repositories::sqlite(pool),
            state,
        }
    }

    pub async fn request(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(token), None).await
    }

    /// Register an account and return `(token, user id)`
    pub async fn register(&self, email: &str, role: &str) -> (String, String) {
        let (status, body) = self
            .request(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({
                    "email": email,
                    "password": "secret123",
                    "name": email.split('@').next().unwrap(),
                    "role": role,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
        (
            body["token"].as_str().unwrap().to_string(),
            body["user"]["id"].as_str().unwrap().to_string(),
        )
    }

    /// Assign a patient to a provider's panel
    pub async fn assign(&self, patient_id: &str, provider_id: &str) {
        let mut record = self.repos.users.find_by_id(patient_id).await.unwrap().unwrap();
        record.provider_id = Some(provider_id.to_string());
        self.repos.users.update(record).await.unwrap();
    }

    /// Start a pregnancy `weeks` along for the caller
    pub async fn start_pregnancy(&self, token: &str, weeks: i64) -> Value {
        let lmp = (chrono::Utc::now() - chrono::Duration::weeks(weeks)).format("%Y-%m-%d").to_string();
        let (status, body) = self
            .post("/api/pregnancy", token, json!({ "lastMenstrualPeriod": lmp }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "start pregnancy failed: {}", body);
        body
    }
}
