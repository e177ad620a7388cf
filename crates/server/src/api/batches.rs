//! Batch status endpoints.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use cidvault_ingest::BatchStatus;

use super::{error_response, ApiError};
use crate::state::AppState;

/// GET /batches
pub async fn batches_list(State(state): State<Arc<AppState>>) -> Json<Vec<BatchStatus>> {
    Json(state.ingestor.batches())
}

/// GET /batches/{id}
pub async fn batch_get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<BatchStatus>, ApiError> {
    state
        .ingestor
        .batch_status(&id)
        .map(Json)
        .ok_or_else(|| error_response(StatusCode::NOT_FOUND, format!("batch not found: {}", id)))
}
