//! HTTP handlers, one module per resource.
//! Shared error helpers live here in mod.rs.

mod batches;
mod health;
mod ipfs;
mod tokens;

use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use cidvault_core::StoreError;

pub type ApiError = (StatusCode, Json<Value>);

pub(crate) fn error_response(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(json!({ "error": message.into() })))
}

/// Map a StoreError to an HTTP response.
pub(crate) fn store_err(e: StoreError) -> ApiError {
    let status =
        StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    error_response(status, e.to_string())
}

// ── Re-exports ───────────────────────────────────────────────────

pub use batches::{batch_get, batches_list};
pub use health::{health, metrics};
pub use ipfs::{upload_cids, UPLOAD_FIELD};
pub use tokens::{token_get, tokens_list};
