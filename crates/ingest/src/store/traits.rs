use async_trait::async_trait;

use cidvault_core::{MetadataDocument, MetadataRecord, StoreError};

#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Persist the document for `cid`. Atomic per call: on error nothing is written.
    async fn insert(&self, cid: &str, document: &MetadataDocument) -> Result<(), StoreError>;

    /// Point lookup. `Ok(None)` when no record exists for `cid`.
    async fn lookup(&self, cid: &str) -> Result<Option<MetadataDocument>, StoreError>;

    /// Every record currently persisted, in no particular order.
    async fn scan_all(&self) -> Result<Vec<MetadataRecord>, StoreError>;

    /// Backend name reported by the health endpoint.
    fn backend(&self) -> &'static str;
}
