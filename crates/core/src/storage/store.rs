//! Document storage trait and types.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Error type for document storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Document not found.
    #[error("Document not found: {0}")]
    NotFound(i64),

    /// A document with this filename already exists.
    #[error("Document already exists: {0}")]
    DuplicateFilename(String),

    /// Backing store unavailable or misbehaving.
    #[error("Database error: {0}")]
    Database(String),

    /// Filesystem failure while writing or removing document bytes.
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One stored document.
#[derive(Debug, Clone, Serialize)]
pub struct StoredDocument {
    /// Unique id, assigned at upload.
    pub id: i64,
    /// Original filename; unique across the catalog.
    pub filename: String,
    /// On-disk location of the document bytes.
    pub path: PathBuf,
    /// Size of the stored bytes.
    pub size_bytes: u64,
    /// Upload time.
    pub uploaded_at: DateTime<Utc>,
}

/// Trait for document storage backends.
pub trait DocumentStore: Send + Sync {
    /// Store document bytes and catalog the result.
    ///
    /// Fails with [`StorageError::DuplicateFilename`] if the filename is
    /// already cataloged; the existing document is left untouched.
    fn save(&self, filename: &str, bytes: &[u8]) -> Result<StoredDocument, StorageError>;

    /// Look up a document by id.
    fn get(&self, id: i64) -> Result<Option<StoredDocument>, StorageError>;

    /// List all documents, newest first.
    fn list(&self) -> Result<Vec<StoredDocument>, StorageError>;

    /// Remove a document's bytes and catalog row.
    fn delete(&self, id: i64) -> Result<StoredDocument, StorageError>;
}
