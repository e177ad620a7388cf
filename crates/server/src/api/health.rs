//! Health and ingestion metrics endpoints.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use cidvault_ingest::MetricsSnapshot;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub store: &'static str,
}

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        store: state.ingestor.store_backend(),
    })
}

#[derive(Serialize)]
pub struct MetricsResponse {
    pub concurrency: usize,
    pub pending: usize,
    pub fetch_failures: u64,
    pub store_failures: u64,
    #[serde(flatten)]
    pub counters: MetricsSnapshot,
}

/// GET /metrics
pub async fn metrics(State(state): State<Arc<AppState>>) -> Json<MetricsResponse> {
    let ingestor = &state.ingestor;
    let counters = ingestor.metrics().snapshot();
    Json(MetricsResponse {
        concurrency: ingestor.concurrency(),
        pending: ingestor.pending(),
        fetch_failures: counters.fetch_failures(),
        store_failures: counters.store_failures(),
        counters,
    })
}
