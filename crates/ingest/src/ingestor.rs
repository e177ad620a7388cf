//! Ingestion orchestrator: bounded fan-out of fetch-then-persist work.
//!
//! [`Ingestor::ingest`] is fire-and-forget: it registers a batch, spawns a
//! detached dispatch task and returns the batch ID immediately. The dispatch
//! task spawns one tokio task per CID up front; each task waits on a shared
//! counting semaphore before fetching, so the ceiling bounds *execution*, not
//! the number of queued tasks.
//!
//! Failures are terminal for that CID only. They are logged, counted in
//! [`IngestMetrics`] and on the batch, and never propagated.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Notify, Semaphore};
use tracing::{debug, error, info, warn};

use cidvault_core::config::IngestConfig;
use cidvault_core::{MetadataDocument, MetadataRecord, StoreError};

use crate::batch::{Batch, BatchId, BatchStatus, BatchTracker};
use crate::metrics::IngestMetrics;
use crate::source::MetadataSource;
use crate::store::MetadataStore;

// ── Pending-unit accounting ─────────────────────────────────────────

/// Count of units created but not yet finished, with a wakeup on reaching zero.
#[derive(Default)]
struct Pending {
    count: AtomicUsize,
    idle: Notify,
}

impl Pending {
    fn add(&self, n: usize) {
        self.count.fetch_add(n, Ordering::SeqCst);
    }

    fn finish_one(&self) {
        if self.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }

    fn get(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.get() == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Marks a unit finished on drop, so every exit path is counted.
struct UnitGuard(Arc<Pending>);

impl Drop for UnitGuard {
    fn drop(&mut self) {
        self.0.finish_one();
    }
}

// ── Ingestor ────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct Ingestor {
    source: Arc<dyn MetadataSource>,
    store: Arc<dyn MetadataStore>,
    permits: Arc<Semaphore>,
    concurrency: usize,
    pending: Arc<Pending>,
    metrics: Arc<IngestMetrics>,
    batches: BatchTracker,
}

impl Ingestor {
    pub fn new(
        source: Arc<dyn MetadataSource>,
        store: Arc<dyn MetadataStore>,
        config: &IngestConfig,
    ) -> Self {
        let concurrency = config.concurrency.max(1);
        Self {
            source,
            store,
            permits: Arc::new(Semaphore::new(concurrency)),
            concurrency,
            pending: Arc::new(Pending::default()),
            metrics: Arc::new(IngestMetrics::new()),
            batches: BatchTracker::new(),
        }
    }

    /// Dispatch one unit of work per non-empty CID and return without waiting.
    ///
    /// Must be called from within a tokio runtime.
    pub fn ingest<I, S>(&self, cids: I) -> BatchId
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let cids: Vec<String> = cids
            .into_iter()
            .map(Into::into)
            .filter(|cid| !cid.is_empty())
            .collect();

        let batch = self.batches.register(cids.len());
        let batch_id = batch.id;
        self.pending.add(cids.len());

        info!(batch_id = %batch_id, cids = cids.len(), "dispatching ingestion batch");

        let this = self.clone();
        tokio::spawn(async move {
            this.dispatch(batch, cids);
        });

        batch_id
    }

    fn dispatch(&self, batch: Arc<Batch>, cids: Vec<String>) {
        for cid in cids {
            let this = self.clone();
            let batch = batch.clone();
            let guard = UnitGuard(self.pending.clone());
            tokio::spawn(async move {
                let _guard = guard;
                this.run_unit(&batch, cid).await;
            });
        }
    }

    /// One fetch-then-persist sequence. The permit is held for the whole unit.
    async fn run_unit(&self, batch: &Batch, cid: String) {
        let _permit = match self.permits.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                warn!(cid = %cid, "ingestor closed, dropping unit of work");
                return;
            }
        };
        let _executing = self.metrics.unit_started();

        debug!(cid = %cid, "fetching metadata");
        match self.source.fetch(&cid).await {
            Ok(document) => self.persist(batch, &cid, &document).await,
            Err(e) => {
                error!(cid = %cid, kind = e.kind(), error = %e, "failed to fetch metadata");
                self.metrics.record_fetch_failure(&e);
                batch.record_fetch_failed();
            }
        }
    }

    async fn persist(&self, batch: &Batch, cid: &str, document: &MetadataDocument) {
        match self.store.insert(cid, document).await {
            Ok(()) => {
                info!(cid = %cid, "metadata stored");
                self.metrics.record_stored();
                batch.record_stored();
            }
            Err(e @ StoreError::ConstraintViolation(_)) => {
                warn!(cid = %cid, error = %e, "metadata already stored, keeping first document");
                self.metrics.record_store_failure(&e);
                batch.record_store_failed();
            }
            Err(e) => {
                error!(cid = %cid, kind = e.kind(), error = %e, "failed to store metadata");
                self.metrics.record_store_failure(&e);
                batch.record_store_failed();
            }
        }
    }

    pub async fn lookup(&self, cid: &str) -> Result<Option<MetadataDocument>, StoreError> {
        self.store.lookup(cid).await
    }

    pub async fn scan_all(&self) -> Result<Vec<MetadataRecord>, StoreError> {
        self.store.scan_all().await
    }

    pub fn batch_status(&self, id: &BatchId) -> Option<BatchStatus> {
        self.batches.get(id)
    }

    pub fn batches(&self) -> Vec<BatchStatus> {
        self.batches.list()
    }

    pub fn metrics(&self) -> &IngestMetrics {
        &self.metrics
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn store_backend(&self) -> &'static str {
        self.store.backend()
    }

    /// Units created but not yet finished, queued or executing.
    pub fn pending(&self) -> usize {
        self.pending.get()
    }

    /// Wait up to `grace` for every pending unit to finish.
    ///
    /// Returns `false` if units were still outstanding when the grace period
    /// ran out; those are abandoned when the runtime shuts down.
    pub async fn drain(&self, grace: Duration) -> bool {
        match tokio::time::timeout(grace, self.pending.wait_idle()).await {
            Ok(()) => true,
            Err(_) => {
                warn!(
                    pending = self.pending(),
                    "shutdown grace period elapsed with units of work still pending"
                );
                false
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
