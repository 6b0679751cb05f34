//! Background task API handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use papermill_core::{metrics, ParseEngine, PoolStatus, Task, TaskFilter, TaskStatus};

use super::ErrorResponse;
use crate::state::AppState;

/// Maximum allowed limit for task queries
const MAX_LIMIT: i64 = 1000;

/// Default limit for task queries
const DEFAULT_LIMIT: i64 = 100;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for listing tasks
#[derive(Debug, Deserialize)]
pub struct ListTasksParams {
    /// Filter by status
    pub status: Option<String>,
    /// Maximum number of tasks to return
    pub limit: Option<i64>,
    /// Pagination offset
    pub offset: Option<i64>,
}

/// Response for submitting a task
#[derive(Debug, Serialize)]
pub struct SubmitTaskResponse {
    pub task_id: i64,
    pub status: TaskStatus,
    pub message: String,
}

/// Response for task operations
#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub task_id: i64,
    pub filename: String,
    pub status: TaskStatus,
    pub created_at: String,
    pub completed_at: Option<String>,
    pub result: Option<String>,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            task_id: task.id,
            filename: task.filename,
            status: task.status,
            created_at: task.created_at.to_rfc3339(),
            completed_at: task.completed_at.map(|t| t.to_rfc3339()),
            result: task.result,
        }
    }
}

/// Response for listing tasks
#[derive(Debug, Serialize)]
pub struct ListTasksResponse {
    pub tasks: Vec<TaskResponse>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

// ============================================================================
// Handlers
// ============================================================================

/// Submit a stored document for background conversion
pub async fn submit_task<E: ParseEngine + 'static>(
    State(state): State<Arc<AppState<E>>>,
    Path(document_id): Path<i64>,
) -> Result<(StatusCode, Json<SubmitTaskResponse>), (StatusCode, Json<ErrorResponse>)> {
    let document = match state.documents().get(document_id) {
        Ok(Some(document)) => document,
        Ok(None) => {
            return Err((
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new(format!(
                    "Document not found: {}",
                    document_id
                ))),
            ));
        }
        Err(e) => {
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(e.to_string())),
            ));
        }
    };

    // The file must still be on disk before a task row is created; a
    // submit that cannot possibly run should not leave a task behind.
    if tokio::fs::metadata(&document.path).await.is_err() {
        return Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(format!(
                "Document file missing: {}",
                document.filename
            ))),
        ));
    }

    let task = match state.tasks().create(&document.filename) {
        Ok(task) => task,
        Err(e) => {
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(e.to_string())),
            ));
        }
    };

    metrics::TASKS_SUBMITTED.inc();
    state.executor().dispatch(task.id, document.path);

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitTaskResponse {
            task_id: task.id,
            status: task.status,
            message: "Task created, processing in background.".to_string(),
        }),
    ))
}

/// Get a task by id
pub async fn get_task<E: ParseEngine + 'static>(
    State(state): State<Arc<AppState<E>>>,
    Path(task_id): Path<i64>,
) -> Result<Json<TaskResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.tasks().get(task_id) {
        Ok(Some(task)) => Ok(Json(TaskResponse::from(task))),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(format!("Task not found: {}", task_id))),
        )),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(e.to_string())),
        )),
    }
}

/// List tasks with optional status filter
pub async fn list_tasks<E: ParseEngine + 'static>(
    State(state): State<Arc<AppState<E>>>,
    Query(params): Query<ListTasksParams>,
) -> Result<Json<ListTasksResponse>, (StatusCode, Json<ErrorResponse>)> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0).max(0);

    let mut filter = TaskFilter::new().with_limit(limit).with_offset(offset);

    if let Some(ref status) = params.status {
        match TaskStatus::parse(status) {
            Some(status) => filter = filter.with_status(status),
            None => {
                return Err((
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse::new(format!("Unknown status: {}", status))),
                ));
            }
        }
    }

    let tasks = state.tasks().list(&filter).map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(e.to_string())),
        )
    })?;

    let total = state.tasks().count(&filter).map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(e.to_string())),
        )
    })?;

    Ok(Json(ListTasksResponse {
        tasks: tasks.into_iter().map(TaskResponse::from).collect(),
        total,
        limit,
        offset,
    }))
}

/// Current executor pool occupancy
pub async fn executor_status<E: ParseEngine + 'static>(
    State(state): State<Arc<AppState<E>>>,
) -> Json<PoolStatus> {
    Json(state.executor().pool_status())
}
