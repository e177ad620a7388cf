//! Process-wide ingestion counters.
//!
//! Unit-of-work failures never reach the caller of `ingest`, so these
//! counters (alongside the logs) are how operators observe them.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use cidvault_core::{FetchError, StoreError};

#[derive(Debug, Default)]
pub struct IngestMetrics {
    fetch_remote_error: AtomicU64,
    fetch_decode_error: AtomicU64,
    fetch_network_error: AtomicU64,
    store_constraint_violation: AtomicU64,
    store_connectivity_error: AtomicU64,
    store_encode_error: AtomicU64,
    stored: AtomicU64,
    /// Units currently holding a concurrency permit.
    executing: AtomicU64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub fetch_remote_error: u64,
    pub fetch_decode_error: u64,
    pub fetch_network_error: u64,
    pub store_constraint_violation: u64,
    pub store_connectivity_error: u64,
    pub store_encode_error: u64,
    pub stored: u64,
    pub executing: u64,
}

impl MetricsSnapshot {
    pub fn fetch_failures(&self) -> u64 {
        self.fetch_remote_error + self.fetch_decode_error + self.fetch_network_error
    }

    pub fn store_failures(&self) -> u64 {
        self.store_constraint_violation + self.store_connectivity_error + self.store_encode_error
    }
}

impl IngestMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_fetch_failure(&self, err: &FetchError) {
        let counter = match err {
            FetchError::RemoteError { .. } => &self.fetch_remote_error,
            FetchError::DecodeError(_) => &self.fetch_decode_error,
            FetchError::NetworkError(_) => &self.fetch_network_error,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_store_failure(&self, err: &StoreError) {
        let counter = match err {
            StoreError::ConstraintViolation(_) => &self.store_constraint_violation,
            StoreError::ConnectivityError(_) => &self.store_connectivity_error,
            StoreError::EncodeError(_) => &self.store_encode_error,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stored(&self) {
        self.stored.fetch_add(1, Ordering::Relaxed);
    }

    /// Raise the `executing` gauge until the returned guard is dropped.
    pub(crate) fn unit_started(&self) -> ExecutingGuard<'_> {
        self.executing.fetch_add(1, Ordering::Relaxed);
        ExecutingGuard(self)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            fetch_remote_error: self.fetch_remote_error.load(Ordering::Relaxed),
            fetch_decode_error: self.fetch_decode_error.load(Ordering::Relaxed),
            fetch_network_error: self.fetch_network_error.load(Ordering::Relaxed),
            store_constraint_violation: self.store_constraint_violation.load(Ordering::Relaxed),
            store_connectivity_error: self.store_connectivity_error.load(Ordering::Relaxed),
            store_encode_error: self.store_encode_error.load(Ordering::Relaxed),
            stored: self.stored.load(Ordering::Relaxed),
            executing: self.executing.load(Ordering::Relaxed),
        }
    }
}

/// Lowers the `executing` gauge on drop, including when a unit panics.
pub(crate) struct ExecutingGuard<'a>(&'a IngestMetrics);

impl Drop for ExecutingGuard<'_> {
    fn drop(&mut self) {
        self.0.executing.fetch_sub(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_are_counted_per_kind() {
        let metrics = IngestMetrics::new();
        metrics.record_fetch_failure(&FetchError::RemoteError { status: 500 });
        metrics.record_fetch_failure(&FetchError::RemoteError { status: 404 });
        metrics.record_fetch_failure(&FetchError::NetworkError("timeout".into()));
        metrics.record_store_failure(&StoreError::ConstraintViolation("dup".into()));
        metrics.record_stored();

        let snap = metrics.snapshot();
        assert_eq!(snap.fetch_remote_error, 2);
        assert_eq!(snap.fetch_network_error, 1);
        assert_eq!(snap.fetch_decode_error, 0);
        assert_eq!(snap.fetch_failures(), 3);
        assert_eq!(snap.store_constraint_violation, 1);
        assert_eq!(snap.store_failures(), 1);
        assert_eq!(snap.stored, 1);
    }

    #[test]
    fn executing_gauge_goes_up_and_down() {
        let metrics = IngestMetrics::new();
        let first = metrics.unit_started();
        let second = metrics.unit_started();
        assert_eq!(metrics.snapshot().executing, 2);
        drop(second);
        assert_eq!(metrics.snapshot().executing, 1);
        drop(first);
        assert_eq!(metrics.snapshot().executing, 0);
    }
}
