use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use cidvault_core::{MetadataDocument, MetadataRecord, StoreError};

use super::traits::MetadataStore;

/// Process-local store. Contents are lost on restart.
///
/// Documents are kept in their canonical encoding, so a lookup returns a
/// fresh decode rather than the instance that was inserted.
#[derive(Default)]
pub struct MemoryMetadataStore {
    records: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn insert(&self, cid: &str, document: &MetadataDocument) -> Result<(), StoreError> {
        let encoded = document
            .to_bytes()
            .map_err(|e| StoreError::EncodeError(e.to_string()))?;
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        if records.contains_key(cid) {
            return Err(StoreError::ConstraintViolation(format!(
                "metadata for cid '{}' already exists",
                cid
            )));
        }
        records.insert(cid.to_string(), encoded);
        Ok(())
    }

    async fn lookup(&self, cid: &str) -> Result<Option<MetadataDocument>, StoreError> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        records.get(cid).map(|bytes| decode(bytes)).transpose()
    }

    async fn scan_all(&self) -> Result<Vec<MetadataRecord>, StoreError> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        records
            .iter()
            .map(|(cid, bytes)| {
                Ok(MetadataRecord {
                    cid: cid.clone(),
                    token: decode(bytes)?,
                })
            })
            .collect()
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

fn decode(bytes: &[u8]) -> Result<MetadataDocument, StoreError> {
    MetadataDocument::from_slice(bytes).map_err(|e| StoreError::EncodeError(e.to_string()))
}
