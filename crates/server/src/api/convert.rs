//! Synchronous conversion handlers.

use axum::{
    extract::{Multipart, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use papermill_core::{BatchDocument, DocumentResult, ParseEngine, PoolStatus};

use super::documents::read_upload;
use super::ErrorResponse;
use crate::state::AppState;

/// Derive the download name for a converted document.
fn markdown_filename(source: &str) -> String {
    match source.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => format!("{}.md", stem),
        _ => format!("{}.md", source),
    }
}

/// Convert one document and return the Markdown as a file download
pub async fn convert_single<E: ParseEngine + 'static>(
    State(state): State<Arc<AppState<E>>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    if state.models().get().is_err() {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse::new("Models are not loaded yet")),
        ));
    }

    let (filename, bytes) = read_upload(&mut multipart, "file")
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(e))))?;

    let result = state
        .coordinator()
        .convert_one(BatchDocument {
            filename: filename.clone(),
            bytes,
        })
        .await;

    if !result.is_ok() {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse::new(
                result
                    .error
                    .unwrap_or_else(|| "Conversion failed".to_string()),
            )),
        ));
    }

    let headers = [
        (header::CONTENT_TYPE, "text/markdown".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", markdown_filename(&filename)),
        ),
    ];
    Ok((headers, result.markdown))
}

/// Convert a batch of documents and return one result per input, in order
pub async fn convert_batch<E: ParseEngine + 'static>(
    State(state): State<Arc<AppState<E>>>,
    mut multipart: Multipart,
) -> Result<Json<Vec<DocumentResult>>, (StatusCode, Json<ErrorResponse>)> {
    if state.models().get().is_err() {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse::new("Models are not loaded yet")),
        ));
    }

    let mut documents = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(format!(
                "Malformed multipart body: {}",
                e
            ))),
        )
    })? {
        if field.name() != Some("files") {
            continue;
        }
        let filename = match field.file_name() {
            Some(name) => name.to_string(),
            None => {
                return Err((
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse::new("Field 'files' has no filename")),
                ));
            }
        };
        let bytes = field.bytes().await.map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new(format!("Could not read upload: {}", e))),
            )
        })?;
        documents.push(BatchDocument {
            filename,
            bytes: bytes.to_vec(),
        });
    }

    if documents.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("No files provided")),
        ));
    }

    Ok(Json(state.coordinator().convert_batch(documents).await))
}

/// Current worker pool occupancy
pub async fn batch_status<E: ParseEngine + 'static>(
    State(state): State<Arc<AppState<E>>>,
) -> Json<PoolStatus> {
    Json(state.coordinator().pool_status())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_filename() {
        assert_eq!(markdown_filename("paper.pdf"), "paper.md");
        assert_eq!(markdown_filename("archive.tar.gz"), "archive.tar.md");
        assert_eq!(markdown_filename("noext"), "noext.md");
        assert_eq!(markdown_filename(".hidden"), ".hidden.md");
    }
}
