//! Server startup: store selection and shared state construction.

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use cidvault_ingest::{GatewaySource, Ingestor, MemoryMetadataStore, MetadataStore, PgMetadataStore};

use crate::db;
use crate::state::AppState;

/// Pick the metadata store: PostgreSQL when configured, in-memory otherwise.
pub async fn build_store(config: &cidvault_core::Config) -> anyhow::Result<Arc<dyn MetadataStore>> {
    match db::init_pg_pool(&config.postgres).await? {
        Some(pool) => Ok(Arc::new(PgMetadataStore::new(pool))),
        None => Ok(Arc::new(MemoryMetadataStore::new())),
    }
}

pub async fn build_ingestor(config: &cidvault_core::Config) -> anyhow::Result<Ingestor> {
    let store = build_store(config).await?;
    let source = GatewaySource::new(&config.gateway).context("failed to build gateway HTTP client")?;
    let ingestor = Ingestor::new(Arc::new(source), store, &config.ingest);
    info!(
        "Ingestor ready (store: {}, concurrency: {})",
        ingestor.store_backend(),
        ingestor.concurrency()
    );
    Ok(ingestor)
}

pub async fn build_app_state(config: &cidvault_core::Config) -> anyhow::Result<Arc<AppState>> {
    let ingestor = build_ingestor(config).await?;
    if config.auth.username.is_none() {
        warn!("BASIC_AUTH_USER not set, protected routes only accept empty credentials");
    }
    Ok(Arc::new(AppState {
        ingestor,
        auth: config.auth.clone(),
        upload_max_bytes: config.server.upload_max_bytes,
    }))
}
