//! Task storage trait and types.

use thiserror::Error;

use super::types::{Task, TaskStatus};

/// Error type for task operations.
#[derive(Debug, Error)]
pub enum TaskError {
    /// Task not found.
    #[error("Task not found: {0}")]
    NotFound(i64),

    /// A transition that does not follow the state machine order.
    /// Under correct executor logic this never fires; it is a defensive
    /// check, not a user-facing case.
    #[error("Invalid transition for task {task_id}: {from:?} -> {to:?}")]
    InvalidTransition {
        task_id: i64,
        from: TaskStatus,
        to: TaskStatus,
    },

    /// Backing store unavailable or misbehaving.
    #[error("Database error: {0}")]
    Database(String),
}

/// Filter for querying tasks.
#[derive(Debug, Clone)]
pub struct TaskFilter {
    /// Filter by status.
    pub status: Option<TaskStatus>,
    /// Maximum number of results.
    pub limit: i64,
    /// Offset for pagination.
    pub offset: i64,
}

impl Default for TaskFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskFilter {
    /// Create a new filter with defaults.
    pub fn new() -> Self {
        Self {
            status: None,
            limit: 100,
            offset: 0,
        }
    }

    /// Filter by status.
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Set limit.
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    /// Set offset.
    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }
}

/// Trait for task storage backends.
pub trait TaskStore: Send + Sync {
    /// Create a new task in `Pending` with `created_at = now`.
    fn create(&self, filename: &str) -> Result<Task, TaskError>;

    /// Get a task by id.
    fn get(&self, id: i64) -> Result<Option<Task>, TaskError>;

    /// Advance a task to `new_status`.
    ///
    /// Fails with [`TaskError::InvalidTransition`] unless `new_status`
    /// directly follows the current status. On terminal transitions,
    /// `completed_at` and `result` are written atomically with `status`;
    /// partial updates are never observable. Conflicting attempts on the
    /// same row are serialized inside the store.
    fn transition(
        &self,
        id: i64,
        new_status: TaskStatus,
        result: Option<String>,
    ) -> Result<Task, TaskError>;

    /// List tasks matching the filter, newest first.
    fn list(&self, filter: &TaskFilter) -> Result<Vec<Task>, TaskError>;

    /// Count tasks matching the filter.
    fn count(&self, filter: &TaskFilter) -> Result<i64, TaskError>;
}
