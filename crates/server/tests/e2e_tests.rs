//! Basic E2E tests for the service surface: health, config, metrics.

mod common;

use axum::http::StatusCode;
use common::TestFixture;

#[tokio::test]
async fn test_health() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/health").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
}

#[tokio::test]
async fn test_config_is_sanitized() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/config").await;
    assert_eq!(response.status, StatusCode::OK);

    // Engine command arguments may embed tokens, the config view elides
    // them and reports only a count.
    let engine = &response.body["engine"];
    assert!(engine.get("program").is_some());
    assert!(engine.get("args_configured").is_some());
    assert!(engine.get("args").is_none());

    assert!(response.body["pool"]["max_workers"].is_u64());
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new().await;

    // Generate some traffic first.
    fixture.get("/api/v1/health").await;

    let response = fixture.get("/metrics").await;
    assert_eq!(response.status, StatusCode::OK);
    let text = response.text();
    assert!(text.contains("papermill_http_requests_total"));
    assert!(text.contains("papermill_pool_active_jobs"));
}

#[tokio::test]
async fn test_unknown_route() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/nope").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
