//! Document upload and management handlers.

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use papermill_core::{ParseEngine, StorageError, StoredDocument};

use super::ErrorResponse;
use crate::state::AppState;

/// Response view of a stored document.
#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    pub id: i64,
    pub filename: String,
    pub size_bytes: u64,
    pub uploaded_at: String,
}

impl From<StoredDocument> for DocumentResponse {
    fn from(document: StoredDocument) -> Self {
        Self {
            id: document.id,
            filename: document.filename,
            size_bytes: document.size_bytes,
            uploaded_at: document.uploaded_at.to_rfc3339(),
        }
    }
}

fn storage_error(e: StorageError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match e {
        StorageError::NotFound(_) => StatusCode::NOT_FOUND,
        StorageError::DuplicateFilename(_) => StatusCode::CONFLICT,
        StorageError::Database(_) | StorageError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ErrorResponse::new(e.to_string())))
}

/// Pull the first file out of a multipart upload.
pub(super) async fn read_upload(
    multipart: &mut Multipart,
    field_name: &str,
) -> Result<(String, Vec<u8>), String> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Malformed multipart body: {}", e))?
    {
        if field.name() != Some(field_name) {
            continue;
        }
        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| format!("Field '{}' has no filename", field_name))?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| format!("Could not read upload: {}", e))?;
        return Ok((filename, bytes.to_vec()));
    }
    Err(format!("Missing multipart field '{}'", field_name))
}

/// Upload a document
pub async fn upload_document<E: ParseEngine + 'static>(
    State(state): State<Arc<AppState<E>>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<DocumentResponse>), (StatusCode, Json<ErrorResponse>)> {
    let (filename, bytes) = read_upload(&mut multipart, "file")
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(e))))?;

    match state.documents().save(&filename, &bytes) {
        Ok(document) => Ok((StatusCode::CREATED, Json(DocumentResponse::from(document)))),
        Err(e) => Err(storage_error(e)),
    }
}

/// List all documents
pub async fn list_documents<E: ParseEngine + 'static>(
    State(state): State<Arc<AppState<E>>>,
) -> Result<Json<Vec<DocumentResponse>>, (StatusCode, Json<ErrorResponse>)> {
    match state.documents().list() {
        Ok(documents) => Ok(Json(
            documents.into_iter().map(DocumentResponse::from).collect(),
        )),
        Err(e) => Err(storage_error(e)),
    }
}

/// Download a document's bytes
pub async fn download_document<E: ParseEngine + 'static>(
    State(state): State<Arc<AppState<E>>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    let document = match state.documents().get(id) {
        Ok(Some(document)) => document,
        Ok(None) => {
            return Err((
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new(format!("Document not found: {}", id))),
            ));
        }
        Err(e) => return Err(storage_error(e)),
    };

    let bytes = tokio::fs::read(&document.path).await.map_err(|_| {
        (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(format!(
                "Document file missing: {}",
                document.filename
            ))),
        )
    })?;

    let headers = [
        (header::CONTENT_TYPE, "application/octet-stream".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", document.filename),
        ),
    ];
    Ok((headers, bytes))
}

/// Delete a document
pub async fn delete_document<E: ParseEngine + 'static>(
    State(state): State<Arc<AppState<E>>>,
    Path(id): Path<i64>,
) -> Result<Json<DocumentResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.documents().delete(id) {
        Ok(document) => Ok(Json(DocumentResponse::from(document))),
        Err(e) => Err(storage_error(e)),
    }
}
