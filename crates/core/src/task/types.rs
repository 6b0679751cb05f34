//! Task record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a conversion task.
///
/// Wire representation matches the polling API contract
/// (`PENDING`, `IN_PROGRESS`, `COMPLETED`, `FAILED`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl TaskStatus {
    /// Stable string form used in SQL and API responses.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Completed => "COMPLETED",
            TaskStatus::Failed => "FAILED",
        }
    }

    /// Parse the stable string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(TaskStatus::Pending),
            "IN_PROGRESS" => Some(TaskStatus::InProgress),
            "COMPLETED" => Some(TaskStatus::Completed),
            "FAILED" => Some(TaskStatus::Failed),
            _ => None,
        }
    }

    /// Whether this state admits no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }

    /// Whether this status directly follows `prev` in the state machine.
    /// Skipping and reversing are both rejected.
    pub fn follows(&self, prev: TaskStatus) -> bool {
        matches!(
            (prev, self),
            (TaskStatus::Pending, TaskStatus::InProgress)
                | (TaskStatus::InProgress, TaskStatus::Completed)
                | (TaskStatus::InProgress, TaskStatus::Failed)
        )
    }
}

/// One asynchronous conversion job.
#[derive(Debug, Clone, Serialize)]
pub struct Task {
    /// Unique id, assigned at creation.
    pub id: i64,
    /// Source document name, set at creation.
    pub filename: String,
    /// Current lifecycle state.
    pub status: TaskStatus,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Set exactly once, at the terminal transition.
    pub completed_at: Option<DateTime<Utc>>,
    /// Success marker or failure message; set at the terminal transition.
    pub result: Option<String>,
}
