//! E2E tests for background task submission and polling.

mod common;

use axum::http::StatusCode;
use common::{TestConfig, TestFixture};
use papermill_core::{testing::MockEngine, DocumentStore, TaskFilter, TaskStore};

async fn upload_document(fixture: &TestFixture, filename: &str, bytes: &[u8]) -> i64 {
    let response = fixture
        .upload("/api/v1/documents", "file", filename, bytes)
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    response.body["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_submit_and_poll_to_completion() {
    let fixture = TestFixture::new().await;
    let document_id = upload_document(&fixture, "paper.pdf", b"# A Paper").await;

    let response = fixture
        .post_empty(&format!("/api/v1/parse/{}", document_id))
        .await;
    assert_eq!(response.status, StatusCode::ACCEPTED);
    assert_eq!(response.body["status"], "PENDING");
    assert_eq!(
        response.body["message"],
        "Task created, processing in background."
    );
    let task_id = response.body["task_id"].as_i64().unwrap();

    let task = fixture.await_task(task_id).await;
    assert_eq!(task["status"], "COMPLETED");
    assert_eq!(task["filename"], "paper.pdf");
    assert_eq!(task["result"], "File parsed successfully.");
    assert!(task["completed_at"].is_string());
}

#[tokio::test]
async fn test_submit_unknown_document_creates_no_task() {
    let fixture = TestFixture::new().await;

    let response = fixture.post_empty("/api/v1/parse/9999").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(response.body["error"].as_str().unwrap().contains("9999"));

    assert_eq!(fixture.tasks.count(&TaskFilter::new()).unwrap(), 0);
}

#[tokio::test]
async fn test_submit_with_file_missing_on_disk() {
    let fixture = TestFixture::new().await;
    let document_id = upload_document(&fixture, "paper.pdf", b"bytes").await;

    // Remove the bytes behind the catalog's back.
    let document = fixture.documents.get(document_id).unwrap().unwrap();
    std::fs::remove_file(&document.path).unwrap();

    let response = fixture
        .post_empty(&format!("/api/v1/parse/{}", document_id))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(fixture.tasks.count(&TaskFilter::new()).unwrap(), 0);
}

#[tokio::test]
async fn test_failed_parse_recorded_on_task() {
    let fixture = TestFixture::new().await;
    let document_id = upload_document(&fixture, "bad.pdf", b"FAIL:missing xref").await;

    let response = fixture
        .post_empty(&format!("/api/v1/parse/{}", document_id))
        .await;
    let task_id = response.body["task_id"].as_i64().unwrap();

    let task = fixture.await_task(task_id).await;
    assert_eq!(task["status"], "FAILED");
    let result = task["result"].as_str().unwrap();
    assert!(result.starts_with("Failed to parse file:"));
    assert!(result.contains("missing xref"));
}

#[tokio::test]
async fn test_poll_before_completion_is_not_terminal() {
    let fixture = TestFixture::with_config(TestConfig {
        engine: MockEngine::new().with_delay(std::time::Duration::from_millis(300)),
        ..TestConfig::default()
    })
    .await;
    let document_id = upload_document(&fixture, "slow.pdf", b"content").await;

    let response = fixture
        .post_empty(&format!("/api/v1/parse/{}", document_id))
        .await;
    let task_id = response.body["task_id"].as_i64().unwrap();

    let early = fixture.get(&format!("/api/v1/tasks/{}", task_id)).await;
    let status = early.body["status"].as_str().unwrap();
    assert!(
        status == "PENDING" || status == "IN_PROGRESS",
        "unexpected early status: {}",
        status
    );
    assert!(early.body["completed_at"].is_null());
    assert!(early.body["result"].is_null());

    let task = fixture.await_task(task_id).await;
    assert_eq!(task["status"], "COMPLETED");
}

#[tokio::test]
async fn test_concurrent_submissions_for_same_document() {
    let fixture = TestFixture::new().await;
    let document_id = upload_document(&fixture, "shared.pdf", b"content").await;

    let first = fixture
        .post_empty(&format!("/api/v1/parse/{}", document_id))
        .await;
    let second = fixture
        .post_empty(&format!("/api/v1/parse/{}", document_id))
        .await;

    let first_id = first.body["task_id"].as_i64().unwrap();
    let second_id = second.body["task_id"].as_i64().unwrap();
    assert_ne!(first_id, second_id);

    let first_task = fixture.await_task(first_id).await;
    let second_task = fixture.await_task(second_id).await;
    assert_eq!(first_task["status"], "COMPLETED");
    assert_eq!(second_task["status"], "COMPLETED");
}

#[tokio::test]
async fn test_get_unknown_task() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/tasks/777").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_tasks_with_status_filter() {
    let fixture = TestFixture::new().await;
    let ok_doc = upload_document(&fixture, "ok.pdf", b"fine").await;
    let bad_doc = upload_document(&fixture, "bad.pdf", b"FAIL:broken").await;

    let ok_task = fixture
        .post_empty(&format!("/api/v1/parse/{}", ok_doc))
        .await
        .body["task_id"]
        .as_i64()
        .unwrap();
    let bad_task = fixture
        .post_empty(&format!("/api/v1/parse/{}", bad_doc))
        .await
        .body["task_id"]
        .as_i64()
        .unwrap();
    fixture.await_task(ok_task).await;
    fixture.await_task(bad_task).await;

    let all = fixture.get("/api/v1/tasks").await;
    assert_eq!(all.status, StatusCode::OK);
    assert_eq!(all.body["total"], 2);
    assert_eq!(all.body["tasks"].as_array().unwrap().len(), 2);

    let failed = fixture.get("/api/v1/tasks?status=FAILED").await;
    assert_eq!(failed.body["total"], 1);
    assert_eq!(failed.body["tasks"][0]["filename"], "bad.pdf");

    let bogus = fixture.get("/api/v1/tasks?status=EXPLODED").await;
    assert_eq!(bogus.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_executor_status() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/tasks/status").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["max_workers"], 5);
    assert!(response.body["total_processed"].is_u64());
}
