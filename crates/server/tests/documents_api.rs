//! E2E tests for document upload, listing, download, and deletion.

mod common;

use axum::http::StatusCode;
use common::TestFixture;

#[tokio::test]
async fn test_upload_and_download_roundtrip() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .upload("/api/v1/documents", "file", "paper.pdf", b"%PDF-1.7 body")
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["filename"], "paper.pdf");
    assert_eq!(response.body["size_bytes"], 13);
    let id = response.body["id"].as_i64().unwrap();

    let download = fixture.get(&format!("/api/v1/documents/{}", id)).await;
    assert_eq!(download.status, StatusCode::OK);
    assert_eq!(download.bytes, b"%PDF-1.7 body");
    assert!(download
        .content_disposition
        .unwrap()
        .contains("paper.pdf"));
}

#[tokio::test]
async fn test_duplicate_filename_conflict() {
    let fixture = TestFixture::new().await;
    fixture
        .upload("/api/v1/documents", "file", "paper.pdf", b"first")
        .await;

    let response = fixture
        .upload("/api/v1/documents", "file", "paper.pdf", b"second")
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert!(response.body["error"]
        .as_str()
        .unwrap()
        .contains("paper.pdf"));
}

#[tokio::test]
async fn test_list_documents() {
    let fixture = TestFixture::new().await;
    fixture
        .upload("/api/v1/documents", "file", "a.pdf", b"a")
        .await;
    fixture
        .upload("/api/v1/documents", "file", "b.pdf", b"b")
        .await;

    let response = fixture.get("/api/v1/documents").await;
    assert_eq!(response.status, StatusCode::OK);
    let docs = response.body.as_array().unwrap();
    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0]["filename"], "b.pdf");
    assert_eq!(docs[1]["filename"], "a.pdf");
}

#[tokio::test]
async fn test_delete_document() {
    let fixture = TestFixture::new().await;
    let uploaded = fixture
        .upload("/api/v1/documents", "file", "paper.pdf", b"bytes")
        .await;
    let id = uploaded.body["id"].as_i64().unwrap();

    let deleted = fixture.delete(&format!("/api/v1/documents/{}", id)).await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.body["filename"], "paper.pdf");

    let gone = fixture.get(&format!("/api/v1/documents/{}", id)).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_unknown_document() {
    let fixture = TestFixture::new().await;
    let response = fixture.delete("/api/v1/documents/42").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_upload_without_file_field() {
    let fixture = TestFixture::new().await;
    let response = fixture
        .upload("/api/v1/documents", "wrong_field", "paper.pdf", b"bytes")
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}
