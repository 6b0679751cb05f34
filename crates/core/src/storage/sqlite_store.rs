//! SQLite-cataloged, filesystem-backed document store.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

use super::store::{DocumentStore, StorageError, StoredDocument};

/// SQLite implementation of [`DocumentStore`].
pub struct SqliteDocumentStore {
    conn: Mutex<Connection>,
    upload_dir: PathBuf,
}

impl SqliteDocumentStore {
    /// Open (or create) the catalog at `db_path`, storing bytes under
    /// `upload_dir`. The upload directory is created if missing.
    pub fn new<P: AsRef<Path>>(db_path: P, upload_dir: PathBuf) -> Result<Self, StorageError> {
        fs::create_dir_all(&upload_dir)?;
        let conn = Connection::open(db_path).map_err(db_err)?;
        let store = Self {
            conn: Mutex::new(conn),
            upload_dir,
        };
        store.init_schema()?;
        Ok(store)
    }

    /// In-memory catalog over `upload_dir`, for tests.
    pub fn in_memory(upload_dir: PathBuf) -> Result<Self, StorageError> {
        fs::create_dir_all(&upload_dir)?;
        let conn = Connection::open_in_memory().map_err(db_err)?;
        let store = Self {
            conn: Mutex::new(conn),
            upload_dir,
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), StorageError> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS documents (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                filename TEXT NOT NULL UNIQUE,
                path TEXT NOT NULL,
                size_bytes INTEGER NOT NULL,
                uploaded_at TEXT NOT NULL
            );",
        )
        .map_err(db_err)?;
        Ok(())
    }

    fn row_to_document(row: &Row) -> rusqlite::Result<StoredDocument> {
        let path: String = row.get(2)?;
        let size_bytes: i64 = row.get(3)?;
        let uploaded_at: String = row.get(4)?;
        Ok(StoredDocument {
            id: row.get(0)?,
            filename: row.get(1)?,
            path: PathBuf::from(path),
            size_bytes: size_bytes as u64,
            uploaded_at: DateTime::parse_from_rfc3339(&uploaded_at)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        4,
                        rusqlite::types::Type::Text,
                        e.to_string().into(),
                    )
                })?,
        })
    }
}

fn db_err(e: rusqlite::Error) -> StorageError {
    StorageError::Database(e.to_string())
}

const SELECT_COLUMNS: &str = "id, filename, path, size_bytes, uploaded_at";

impl DocumentStore for SqliteDocumentStore {
    fn save(&self, filename: &str, bytes: &[u8]) -> Result<StoredDocument, StorageError> {
        let conn = self.conn.lock().unwrap();

        let exists: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM documents WHERE filename = ?1",
                params![filename],
                |row| row.get(0),
            )
            .map_err(db_err)?;
        if exists > 0 {
            return Err(StorageError::DuplicateFilename(filename.to_string()));
        }

        let path = self.upload_dir.join(filename);
        fs::write(&path, bytes)?;

        let now = Utc::now();
        let inserted = conn.execute(
            "INSERT INTO documents (filename, path, size_bytes, uploaded_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                filename,
                path.to_string_lossy(),
                bytes.len() as i64,
                now.to_rfc3339()
            ],
        );
        if let Err(e) = inserted {
            // Keep disk and catalog consistent if the insert loses.
            let _ = fs::remove_file(&path);
            return Err(db_err(e));
        }
        let id = conn.last_insert_rowid();

        debug!("Stored document {} ({} bytes) as {}", filename, bytes.len(), id);
        Ok(StoredDocument {
            id,
            filename: filename.to_string(),
            path,
            size_bytes: bytes.len() as u64,
            uploaded_at: now,
        })
    }

    fn get(&self, id: i64) -> Result<Option<StoredDocument>, StorageError> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            &format!("SELECT {} FROM documents WHERE id = ?1", SELECT_COLUMNS),
            params![id],
            Self::row_to_document,
        )
        .optional()
        .map_err(db_err)
    }

    fn list(&self) -> Result<Vec<StoredDocument>, StorageError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM documents ORDER BY id DESC",
                SELECT_COLUMNS
            ))
            .map_err(db_err)?;
        let rows = stmt.query_map([], Self::row_to_document).map_err(db_err)?;
        let mut documents = Vec::new();
        for row in rows {
            documents.push(row.map_err(db_err)?);
        }
        Ok(documents)
    }

    fn delete(&self, id: i64) -> Result<StoredDocument, StorageError> {
        let conn = self.conn.lock().unwrap();
        let document = conn
            .query_row(
                &format!("SELECT {} FROM documents WHERE id = ?1", SELECT_COLUMNS),
                params![id],
                Self::row_to_document,
            )
            .optional()
            .map_err(db_err)?
            .ok_or(StorageError::NotFound(id))?;

        conn.execute("DELETE FROM documents WHERE id = ?1", params![id])
            .map_err(db_err)?;

        // A missing file is not fatal; the catalog row is gone either way.
        if let Err(e) = fs::remove_file(&document.path) {
            warn!("Could not remove {}: {}", document.path.display(), e);
        }

        debug!("Deleted document {} ({})", document.id, document.filename);
        Ok(document)
    }
}
