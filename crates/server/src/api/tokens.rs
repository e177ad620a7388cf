//! Stored metadata retrieval.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::error;

use cidvault_core::{MetadataDocument, MetadataRecord};

use super::{error_response, store_err, ApiError};
use crate::state::AppState;

/// GET /tokens
pub async fn tokens_list(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<MetadataRecord>>, ApiError> {
    let records = state.ingestor.scan_all().await.map_err(|e| {
        error!(error = %e, "failed to fetch all tokens");
        store_err(e)
    })?;
    Ok(Json(records))
}

/// GET /tokens/{cid}
pub async fn token_get(
    State(state): State<Arc<AppState>>,
    Path(cid): Path<String>,
) -> Result<Json<MetadataDocument>, ApiError> {
    let token = state.ingestor.lookup(&cid).await.map_err(|e| {
        error!(cid = %cid, error = %e, "failed to fetch token by cid");
        store_err(e)
    })?;
    token.map(Json).ok_or_else(|| {
        error_response(StatusCode::NOT_FOUND, format!("no metadata stored for cid: {}", cid))
    })
}
