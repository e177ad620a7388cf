//! In-memory batch tracking.
//!
//! Each call to `Ingestor::ingest` registers a [`Batch`] whose counters are
//! bumped by its units of work. Nothing here is persisted and the oldest
//! batches are evicted once [`MAX_TRACKED_BATCHES`] is exceeded.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use uuid::Uuid;

pub type BatchId = Uuid;

pub const MAX_TRACKED_BATCHES: usize = 1024;

#[derive(Debug)]
pub struct Batch {
    pub id: BatchId,
    /// Units of work created, i.e. non-empty CIDs in the submission.
    pub submitted: u64,
    pub created_at: DateTime<Utc>,
    stored: AtomicU64,
    fetch_failed: AtomicU64,
    store_failed: AtomicU64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchStatus {
    pub id: BatchId,
    pub submitted: u64,
    pub stored: u64,
    pub fetch_failed: u64,
    pub store_failed: u64,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

impl Batch {
    fn new(submitted: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            submitted,
            created_at: Utc::now(),
            stored: AtomicU64::new(0),
            fetch_failed: AtomicU64::new(0),
            store_failed: AtomicU64::new(0),
        }
    }

    pub fn record_stored(&self) {
        self.stored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fetch_failed(&self) {
        self.fetch_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_store_failed(&self) {
        self.store_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn status(&self) -> BatchStatus {
        let stored = self.stored.load(Ordering::Relaxed);
        let fetch_failed = self.fetch_failed.load(Ordering::Relaxed);
        let store_failed = self.store_failed.load(Ordering::Relaxed);
        BatchStatus {
            id: self.id,
            submitted: self.submitted,
            stored,
            fetch_failed,
            store_failed,
            completed: stored + fetch_failed + store_failed >= self.submitted,
            created_at: self.created_at,
        }
    }
}

#[derive(Clone, Default)]
pub struct BatchTracker {
    batches: Arc<RwLock<IndexMap<BatchId, Arc<Batch>>>>,
}

impl BatchTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, submitted: usize) -> Arc<Batch> {
        let batch = Arc::new(Batch::new(submitted as u64));
        let mut batches = self.batches.write().unwrap_or_else(PoisonError::into_inner);
        batches.insert(batch.id, batch.clone());
        while batches.len() > MAX_TRACKED_BATCHES {
            batches.shift_remove_index(0);
        }
        batch
    }

    pub fn get(&self, id: &BatchId) -> Option<BatchStatus> {
        let batches = self.batches.read().unwrap_or_else(PoisonError::into_inner);
        batches.get(id).map(|b| b.status())
    }

    /// Most recent first.
    pub fn list(&self) -> Vec<BatchStatus> {
        let batches = self.batches.read().unwrap_or_else(PoisonError::into_inner);
        batches.values().rev().map(|b| b.status()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_batch_is_immediately_complete() {
        let tracker = BatchTracker::new();
        let batch = tracker.register(0);
        assert!(tracker.get(&batch.id).unwrap().completed);
    }

    #[test]
    fn completion_counts_every_outcome() {
        let tracker = BatchTracker::new();
        let batch = tracker.register(3);
        batch.record_stored();
        batch.record_fetch_failed();
        assert!(!tracker.get(&batch.id).unwrap().completed);

        batch.record_store_failed();
        let status = tracker.get(&batch.id).unwrap();
        assert!(status.completed);
        assert_eq!(status.stored, 1);
        assert_eq!(status.fetch_failed, 1);
        assert_eq!(status.store_failed, 1);
    }

    #[test]
    fn unknown_batch_is_none() {
        assert!(BatchTracker::new().get(&Uuid::new_v4()).is_none());
    }

    #[test]
    fn oldest_batches_are_evicted() {
        let tracker = BatchTracker::new();
        let first = tracker.register(1);
        for _ in 0..MAX_TRACKED_BATCHES {
            tracker.register(1);
        }
        assert!(tracker.get(&first.id).is_none());
        assert_eq!(tracker.list().len(), MAX_TRACKED_BATCHES);
    }

    #[test]
    fn list_is_newest_first() {
        let tracker = BatchTracker::new();
        let a = tracker.register(1);
        let b = tracker.register(2);
        let ids: Vec<_> = tracker.list().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![b.id, a.id]);
    }
}
