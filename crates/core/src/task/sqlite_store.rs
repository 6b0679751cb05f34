//! SQLite-backed task store.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;

use super::store::{TaskError, TaskFilter, TaskStore};
use super::types::{Task, TaskStatus};

/// SQLite implementation of [`TaskStore`].
///
/// The connection is wrapped in a mutex; holding it across the read-check
/// and guarded update inside [`TaskStore::transition`] is what serializes
/// conflicting transitions on the same row.
pub struct SqliteTaskStore {
    conn: Mutex<Connection>,
}

impl SqliteTaskStore {
    /// Open (or create) a task database at the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, TaskError> {
        let conn = Connection::open(path).map_err(db_err)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store, for tests.
    pub fn in_memory() -> Result<Self, TaskError> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), TaskError> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS tasks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                filename TEXT NOT NULL,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL,
                completed_at TEXT,
                result TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status);",
        )
        .map_err(db_err)?;
        Ok(())
    }

    fn row_to_task(row: &Row) -> rusqlite::Result<Task> {
        let status_str: String = row.get(2)?;
        let status = TaskStatus::parse(&status_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                2,
                rusqlite::types::Type::Text,
                format!("unknown task status: {}", status_str).into(),
            )
        })?;
        let created_at: String = row.get(3)?;
        let completed_at: Option<String> = row.get(4)?;
        Ok(Task {
            id: row.get(0)?,
            filename: row.get(1)?,
            status,
            created_at: parse_timestamp(&created_at, 3)?,
            completed_at: completed_at
                .map(|t| parse_timestamp(&t, 4))
                .transpose()?,
            result: row.get(5)?,
        })
    }
}

fn parse_timestamp(s: &str, col: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                col,
                rusqlite::types::Type::Text,
                e.to_string().into(),
            )
        })
}

fn db_err(e: rusqlite::Error) -> TaskError {
    TaskError::Database(e.to_string())
}

const SELECT_COLUMNS: &str = "id, filename, status, created_at, completed_at, result";

impl TaskStore for SqliteTaskStore {
    fn create(&self, filename: &str) -> Result<Task, TaskError> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now();
        conn.execute(
            "INSERT INTO tasks (filename, status, created_at) VALUES (?1, ?2, ?3)",
            params![filename, TaskStatus::Pending.as_str(), now.to_rfc3339()],
        )
        .map_err(db_err)?;
        let id = conn.last_insert_rowid();
        debug!("Created task {} for {}", id, filename);
        Ok(Task {
            id,
            filename: filename.to_string(),
            status: TaskStatus::Pending,
            created_at: now,
            completed_at: None,
            result: None,
        })
    }

    fn get(&self, id: i64) -> Result<Option<Task>, TaskError> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            &format!("SELECT {} FROM tasks WHERE id = ?1", SELECT_COLUMNS),
            params![id],
            Self::row_to_task,
        )
        .optional()
        .map_err(db_err)
    }

    fn transition(
        &self,
        id: i64,
        new_status: TaskStatus,
        result: Option<String>,
    ) -> Result<Task, TaskError> {
        let conn = self.conn.lock().unwrap();

        let mut task = conn
            .query_row(
                &format!("SELECT {} FROM tasks WHERE id = ?1", SELECT_COLUMNS),
                params![id],
                Self::row_to_task,
            )
            .optional()
            .map_err(db_err)?
            .ok_or(TaskError::NotFound(id))?;

        if !new_status.follows(task.status) {
            return Err(TaskError::InvalidTransition {
                task_id: id,
                from: task.status,
                to: new_status,
            });
        }

        let completed_at = new_status.is_terminal().then(Utc::now);
        let stored_result = if new_status.is_terminal() {
            result
        } else {
            None
        };

        // Guarded on the status we just read. The row cannot change under
        // us while the mutex is held, so zero rows here means a logic bug
        // rather than a race; surface it as an invalid transition anyway.
        let updated = conn
            .execute(
                "UPDATE tasks SET status = ?1, completed_at = ?2, result = ?3
                 WHERE id = ?4 AND status = ?5",
                params![
                    new_status.as_str(),
                    completed_at.map(|t| t.to_rfc3339()),
                    stored_result,
                    id,
                    task.status.as_str()
                ],
            )
            .map_err(db_err)?;
        if updated == 0 {
            return Err(TaskError::InvalidTransition {
                task_id: id,
                from: task.status,
                to: new_status,
            });
        }

        debug!(
            "Task {} transitioned {} -> {}",
            id,
            task.status.as_str(),
            new_status.as_str()
        );

        task.status = new_status;
        task.completed_at = completed_at;
        task.result = stored_result;
        Ok(task)
    }

    fn list(&self, filter: &TaskFilter) -> Result<Vec<Task>, TaskError> {
        let conn = self.conn.lock().unwrap();
        let mut tasks = Vec::new();
        match filter.status {
            Some(status) => {
                let mut stmt = conn
                    .prepare(&format!(
                        "SELECT {} FROM tasks WHERE status = ?1
                         ORDER BY id DESC LIMIT ?2 OFFSET ?3",
                        SELECT_COLUMNS
                    ))
                    .map_err(db_err)?;
                let rows = stmt
                    .query_map(
                        params![status.as_str(), filter.limit, filter.offset],
                        Self::row_to_task,
                    )
                    .map_err(db_err)?;
                for row in rows {
                    tasks.push(row.map_err(db_err)?);
                }
            }
            None => {
                let mut stmt = conn
                    .prepare(&format!(
                        "SELECT {} FROM tasks ORDER BY id DESC LIMIT ?1 OFFSET ?2",
                        SELECT_COLUMNS
                    ))
                    .map_err(db_err)?;
                let rows = stmt
                    .query_map(params![filter.limit, filter.offset], Self::row_to_task)
                    .map_err(db_err)?;
                for row in rows {
                    tasks.push(row.map_err(db_err)?);
                }
            }
        }
        Ok(tasks)
    }

    fn count(&self, filter: &TaskFilter) -> Result<i64, TaskError> {
        let conn = self.conn.lock().unwrap();
        match filter.status {
            Some(status) => conn
                .query_row(
                    "SELECT COUNT(*) FROM tasks WHERE status = ?1",
                    params![status.as_str()],
                    |row| row.get(0),
                )
                .map_err(db_err),
            None => conn
                .query_row("SELECT COUNT(*) FROM tasks", [], |row| row.get(0))
                .map_err(db_err),
        }
    }
}
