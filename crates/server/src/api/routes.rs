use axum::{
    middleware::from_fn,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use papermill_core::ParseEngine;

use super::{convert, documents, handlers, middleware, tasks};
use crate::state::AppState;

pub fn create_router<E: ParseEngine + 'static>(state: Arc<AppState<E>>) -> Router {
    // API routes
    let api_routes = Router::<Arc<AppState<E>>>::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Documents
        .route("/documents", post(documents::upload_document))
        .route("/documents", get(documents::list_documents))
        .route("/documents/{id}", get(documents::download_document))
        .route("/documents/{id}", delete(documents::delete_document))
        // Synchronous conversion
        .route("/convert", post(convert::convert_single))
        .route("/convert/batch", post(convert::convert_batch))
        .route("/batch/status", get(convert::batch_status))
        // Background tasks
        .route("/parse/{document_id}", post(tasks::submit_task))
        .route("/tasks", get(tasks::list_tasks))
        .route("/tasks/status", get(tasks::executor_status))
        .route("/tasks/{task_id}", get(tasks::get_task));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .with_state(state)
        .layer(from_fn(middleware::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
