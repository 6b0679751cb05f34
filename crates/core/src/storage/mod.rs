//! Uploaded document storage.
//!
//! Documents live in two places that must stay consistent: raw bytes on
//! disk under the configured upload directory, and a catalog row in SQLite.
//! The store owns both sides; callers never touch the upload directory
//! directly.

mod sqlite_store;
mod store;

pub use sqlite_store::SqliteDocumentStore;
pub use store::{DocumentStore, StorageError, StoredDocument};
