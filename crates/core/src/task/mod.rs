//! Asynchronous conversion task records and their lifecycle.
//!
//! A task tracks one background document conversion from creation through a
//! terminal state. Transitions are monotonic:
//! `Pending -> InProgress -> {Completed | Failed}` with no skips and no
//! reversals; the store enforces this, not its callers.

mod sqlite_store;
mod store;
mod types;

pub use sqlite_store::SqliteTaskStore;
pub use store::{TaskError, TaskFilter, TaskStore};
pub use types::{Task, TaskStatus};
