//! Metadata ingestion: gateway client, keyed stores and the bounded
//! fire-and-forget orchestrator that connects them.

pub mod batch;
pub mod ingestor;
pub mod metrics;
pub mod source;
pub mod store;

pub use batch::{BatchId, BatchStatus, BatchTracker};
pub use ingestor::Ingestor;
pub use metrics::{IngestMetrics, MetricsSnapshot};
pub use source::{GatewaySource, MetadataSource};
pub use store::{MemoryMetadataStore, MetadataStore, PgMetadataStore};
