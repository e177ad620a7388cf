//! CID list upload.

use std::sync::Arc;

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::{error, info};

use cidvault_ingest::BatchId;

use super::{error_response, ApiError};
use crate::csv::parse_cid_list;
use crate::state::AppState;

/// Multipart field carrying the CSV file.
pub const UPLOAD_FIELD: &str = "ipfs-list";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: &'static str,
    pub batch_id: BatchId,
    /// Non-empty CIDs dispatched for ingestion.
    pub accepted: usize,
}

/// POST /ipfs
///
/// Accepts `multipart/form-data` with a CSV file in the `ipfs-list` field.
/// Responds as soon as the batch is dispatched; fetches and inserts happen
/// in the background and their outcome is only visible via `/batches/{id}`.
pub async fn upload_cids(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut multipart = multipart.map_err(|e| {
        error!(error = %e, "rejected CID upload");
        error_response(
            StatusCode::BAD_REQUEST,
            "Content-Type must be multipart/form-data",
        )
    })?;

    let mut csv_bytes = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| error_response(e.status(), format!("Multipart error: {e}")))?
    {
        if field.name() == Some(UPLOAD_FIELD) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| error_response(e.status(), format!("Failed to read file: {e}")))?;
            csv_bytes = Some(bytes);
            break;
        }
    }

    let csv_bytes = csv_bytes.ok_or_else(|| {
        error_response(
            StatusCode::BAD_REQUEST,
            format!("missing multipart field '{}'", UPLOAD_FIELD),
        )
    })?;

    let cids = parse_cid_list(&csv_bytes).map_err(|e| {
        error!(error = %e, "error parsing CSV");
        error_response(StatusCode::BAD_REQUEST, format!("Error parsing CSV: {e}"))
    })?;

    let accepted = cids.len();
    let batch_id = state.ingestor.ingest(cids);
    info!(batch_id = %batch_id, accepted, "CID list accepted");

    Ok(Json(UploadResponse {
        message: "IPFS metadata ingestion started",
        batch_id,
        accepted,
    }))
}
