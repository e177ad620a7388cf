use async_trait::async_trait;

use cidvault_core::{FetchError, MetadataDocument};

/// A remote origin that resolves a CID to its JSON metadata document.
///
/// Each call is a single attempt: implementations must not retry or cache.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn fetch(&self, cid: &str) -> Result<MetadataDocument, FetchError>;
}
