//! Background task execution.
//!
//! Submission and execution are decoupled: the HTTP handler persists the
//! document and task row, then hands the task id to the executor and
//! returns. The executor runs the conversion on the shared worker pool and
//! drives the task row to its terminal state. It owns its own store handle;
//! nothing request-scoped survives into the background job.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::engine::ParseEngine;
use crate::metrics;
use crate::pool::{PoolStatus, WorkerPool};
use crate::processor::DocumentProcessor;
use crate::task::{TaskStatus, TaskStore};

/// Result message recorded on successful conversion.
pub const TASK_SUCCESS_MESSAGE: &str = "File parsed successfully.";

/// Executes conversion tasks in the background.
pub struct BackgroundExecutor<E: ParseEngine> {
    processor: DocumentProcessor<E>,
    tasks: Arc<dyn TaskStore>,
    pool: WorkerPool,
}

impl<E: ParseEngine + 'static> BackgroundExecutor<E> {
    /// Creates a new executor over the shared worker pool.
    pub fn new(
        processor: DocumentProcessor<E>,
        tasks: Arc<dyn TaskStore>,
        pool: WorkerPool,
    ) -> Self {
        Self {
            processor,
            tasks,
            pool,
        }
    }

    /// Spawn the conversion for an already-created task and return
    /// immediately. The caller must have persisted both the document at
    /// `path` and the task row before dispatching.
    ///
    /// The join handle is returned for tests; production callers drop it.
    pub fn dispatch(&self, task_id: i64, path: PathBuf) -> JoinHandle<()> {
        let processor = self.processor.clone();
        let tasks = Arc::clone(&self.tasks);
        let pool = self.pool.clone();
        tokio::spawn(async move {
            run_task(processor, tasks, pool, task_id, path).await;
        })
    }

    /// Snapshot of the shared pool this executor draws from.
    pub fn pool_status(&self) -> PoolStatus {
        self.pool.status()
    }
}

async fn run_task<E: ParseEngine>(
    processor: DocumentProcessor<E>,
    tasks: Arc<dyn TaskStore>,
    pool: WorkerPool,
    task_id: i64,
    path: PathBuf,
) {
    // Claim the task before touching the pool; if the row is gone or
    // already claimed there is nothing to do.
    if let Err(e) = tasks.transition(task_id, TaskStatus::InProgress, None) {
        error!("Could not claim task {}: {}", task_id, e);
        return;
    }

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned());

    let outcome = match pool.acquire().await {
        Ok(permit) => {
            let outcome = match tokio::fs::read(&path).await {
                Ok(bytes) => {
                    let result = processor.convert(&filename, &bytes).await;
                    if result.is_ok() {
                        Ok(())
                    } else {
                        Err(result.error.unwrap_or_else(|| "unknown error".to_string()))
                    }
                }
                Err(e) => Err(format!("could not read {}: {}", path.display(), e)),
            };
            drop(permit);
            outcome
        }
        Err(e) => Err(e.to_string()),
    };

    let (status, message, label) = match outcome {
        Ok(()) => (
            TaskStatus::Completed,
            TASK_SUCCESS_MESSAGE.to_string(),
            "completed",
        ),
        Err(e) => {
            warn!("Task {} failed: {}", task_id, e);
            (
                TaskStatus::Failed,
                format!("Failed to parse file: {}", e),
                "failed",
            )
        }
    };

    pool.record_outcome(status == TaskStatus::Completed);
    metrics::TASKS_FINISHED.with_label_values(&[label]).inc();

    match tasks.transition(task_id, status, Some(message)) {
        Ok(task) => info!(
            "Task {} finished as {} ({})",
            task_id,
            task.status.as_str(),
            task.filename
        ),
        Err(e) => error!("Could not finalize task {}: {}", task_id, e),
    }
}
