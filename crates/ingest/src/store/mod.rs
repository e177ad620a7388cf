//! Keyed persistence for metadata documents.
//!
//! [`MetadataStore`] is implemented by [`PgMetadataStore`] for the
//! `ipfs_metadata` table and by [`MemoryMetadataStore`] for tests and
//! database-less runs. Both enforce the same duplicate rule: the first
//! insert for a CID wins and later inserts fail with
//! [`StoreError::ConstraintViolation`](cidvault_core::StoreError).

pub mod memory;
pub mod postgres;
pub mod traits;

pub use memory::MemoryMetadataStore;
pub use postgres::PgMetadataStore;
pub use traits::MetadataStore;
