mod common;

use std::sync::Arc;

use axum::http::{Method, StatusCode};

use common::TestApp;
use mom_care_api::api::create_application;
use mom_care_domain::testing::MockHealthService;

#[tokio::test]
async fn test_health_is_public_and_healthy() {
    let app = TestApp::new();

    let (status, body) = app.request(Method::GET, "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["environment"], "test");
    assert_eq!(body["components"]["database"]["status"], "healthy");
    assert_eq!(body["components"]["push"]["status"], "disabled");
}

#[tokio::test]
async fn test_degraded_health_returns_503() {
    let mut app = TestApp::new();
    let state = app.state.clone().with_health(Arc::new(MockHealthService::new().with_degraded_database()));
    app.router = create_application(state);

    let (status, body) = app.request(Method::GET, "/api/health", None, None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "degraded");
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = TestApp::new();

    let (status, body) = app.request(Method::GET, "/api-docs/openapi.json", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["info"]["title"], "MomCare API");
    assert!(body["paths"]["/api/vitals"].is_object());
}
