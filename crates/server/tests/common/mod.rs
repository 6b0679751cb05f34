//! Common test utilities for E2E testing with a mock engine.
//!
//! This module provides a test fixture that creates an in-process server
//! with a controllable parse engine, enabling comprehensive E2E testing
//! without spawning real engine subprocesses.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use papermill_core::{
    config::{Config, EngineConfig, PoolConfig},
    testing::MockEngine,
    BackgroundExecutor, BatchCoordinator, DocumentProcessor, DocumentStore, ModelLoader,
    ProcessorConfig, SqliteDocumentStore, SqliteTaskStore, TaskStore, WorkerPool,
};
use papermill_server::api::create_router;
use papermill_server::state::AppState;

const BOUNDARY: &str = "papermill-test-boundary";

/// Test fixture for E2E testing with a mock engine.
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock engine - controls parse outcomes via document content
    pub engine: Arc<MockEngine>,
    /// Task store, for direct assertions
    pub tasks: Arc<dyn TaskStore>,
    /// Document store, for direct assertions
    pub documents: Arc<dyn DocumentStore>,
    /// Temporary directory for uploads and the model dir
    pub temp_dir: TempDir,
}

/// Fixture knobs.
pub struct TestConfig {
    pub engine: MockEngine,
    pub max_workers: usize,
    /// When false, the model loader is left uninitialized.
    pub load_models: bool,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            engine: MockEngine::new(),
            max_workers: 5,
            load_models: true,
        }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub bytes: Vec<u8>,
    pub content_disposition: Option<String>,
}

impl TestResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

impl TestFixture {
    /// Create a fixture with default configuration.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    /// Create a fixture with a custom engine.
    pub async fn with_engine(engine: MockEngine) -> Self {
        Self::with_config(TestConfig {
            engine,
            ..TestConfig::default()
        })
        .await
    }

    /// Create a fixture with custom configuration.
    pub async fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let model_dir = temp_dir.path().join("models");
        std::fs::create_dir_all(&model_dir).expect("Failed to create model dir");

        let engine = Arc::new(test_config.engine);

        let models = Arc::new(ModelLoader::new(EngineConfig {
            model_dir,
            ..Default::default()
        }));
        if test_config.load_models {
            models.initialize().await.expect("Failed to load models");
        }

        let tasks: Arc<dyn TaskStore> =
            Arc::new(SqliteTaskStore::in_memory().expect("Failed to create task store"));
        let documents: Arc<dyn DocumentStore> = Arc::new(
            SqliteDocumentStore::in_memory(temp_dir.path().join("uploads"))
                .expect("Failed to create document store"),
        );

        let processor = DocumentProcessor::new(
            Arc::clone(&engine),
            Arc::clone(&models),
            ProcessorConfig::default(),
        );
        let pool = WorkerPool::new(&PoolConfig {
            max_workers: test_config.max_workers,
        });
        let executor =
            BackgroundExecutor::new(processor.clone(), Arc::clone(&tasks), pool.clone());
        let coordinator = BatchCoordinator::new(processor, pool.clone());

        let state = Arc::new(AppState::new(
            Config::default(),
            models,
            Arc::clone(&tasks),
            Arc::clone(&documents),
            executor,
            coordinator,
            pool,
        ));

        Self {
            router: create_router(state),
            engine,
            tasks,
            documents,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("DELETE")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Send a POST request with no body.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// POST a multipart upload with a single part.
    pub async fn upload(
        &self,
        path: &str,
        field: &str,
        filename: &str,
        bytes: &[u8],
    ) -> TestResponse {
        self.upload_many(path, field, &[(filename, bytes)]).await
    }

    /// POST a multipart upload with one part per file, all under `field`.
    pub async fn upload_many(
        &self,
        path: &str,
        field: &str,
        files: &[(&str, &[u8])],
    ) -> TestResponse {
        let mut body = Vec::new();
        for (filename, bytes) in files {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                    field, filename
                )
                .as_bytes(),
            );
            body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    /// Poll a task until it reaches a terminal state.
    pub async fn await_task(&self, task_id: i64) -> Value {
        for _ in 0..200 {
            let response = self.get(&format!("/api/v1/tasks/{}", task_id)).await;
            assert_eq!(response.status, StatusCode::OK);
            let status = response.body["status"].as_str().unwrap_or_default().to_string();
            if status == "COMPLETED" || status == "FAILED" {
                return response.body;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("Task {} did not reach a terminal state", task_id);
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let content_disposition = response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes()
            .to_vec();

        let body: Value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            body,
            bytes,
            content_disposition,
        }
    }
}
