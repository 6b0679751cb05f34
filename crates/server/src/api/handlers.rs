use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use papermill_core::{ParseEngine, SanitizedConfig};

use crate::metrics::{collect_dynamic_metrics, encode_metrics};
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn get_config<E: ParseEngine + 'static>(
    State(state): State<Arc<AppState<E>>>,
) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

pub async fn metrics<E: ParseEngine + 'static>(State(state): State<Arc<AppState<E>>>) -> String {
    collect_dynamic_metrics(state.as_ref());
    encode_metrics()
}
