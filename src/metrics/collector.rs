use crate::metrics::snapshot::RunSummary;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use std::time::{Duration, Instant};

#[derive(Clone)]
pub struct MetricsCollector {
    urls_queued: Arc<AtomicU64>,
    urls_processed: Arc<AtomicU64>,
    urls_succeeded: Arc<AtomicU64>,
    urls_failed: Arc<AtomicU64>,
    urls_skipped: Arc<AtomicU64>,
    fetches_total: Arc<AtomicU64>,
    fetches_failed: Arc<AtomicU64>,
    rows_appended: Arc<AtomicU64>,
    cells_appended: Arc<AtomicU64>,
    writes_failed: Arc<AtomicU64>,
    active_workers: Arc<AtomicU64>,
    total_fetch_time_ms: Arc<AtomicU64>,
    start_time: Arc<Instant>,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self {
            urls_queued: Arc::new(AtomicU64::new(0)),
            urls_processed: Arc::new(AtomicU64::new(0)),
            urls_succeeded: Arc::new(AtomicU64::new(0)),
            urls_failed: Arc::new(AtomicU64::new(0)),
            urls_skipped: Arc::new(AtomicU64::new(0)),
            fetches_total: Arc::new(AtomicU64::new(0)),
            fetches_failed: Arc::new(AtomicU64::new(0)),
            rows_appended: Arc::new(AtomicU64::new(0)),
            cells_appended: Arc::new(AtomicU64::new(0)),
            writes_failed: Arc::new(AtomicU64::new(0)),
            active_workers: Arc::new(AtomicU64::new(0)),
            total_fetch_time_ms: Arc::new(AtomicU64::new(0)),
            start_time: Arc::new(Instant::now()),
        }
    }
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_urls_queued(&self) {
        self.urls_queued.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_url_succeeded(&self) {
        self.urls_processed.fetch_add(1, Ordering::SeqCst);
        self.urls_succeeded.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_url_failed(&self) {
        self.urls_processed.fetch_add(1, Ordering::SeqCst);
        self.urls_failed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_url_skipped(&self) {
        self.urls_processed.fetch_add(1, Ordering::SeqCst);
        self.urls_skipped.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_fetch(&self, duration: Duration, ok: bool) {
        self.fetches_total.fetch_add(1, Ordering::SeqCst);
        if !ok {
            self.fetches_failed.fetch_add(1, Ordering::SeqCst);
        }
        self.total_fetch_time_ms
            .fetch_add(duration.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn record_append(&self, rows: u64, cells: u64) {
        self.rows_appended.fetch_add(rows, Ordering::SeqCst);
        self.cells_appended.fetch_add(cells, Ordering::SeqCst);
    }

    pub fn increment_writes_failed(&self) {
        self.writes_failed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn increment_active_workers(&self) {
        self.active_workers.fetch_add(1, Ordering::SeqCst);
    }

    pub fn decrement_active_workers(&self) {
        self.active_workers.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> RunSummary {
        let processed = self.urls_processed.load(Ordering::SeqCst);
        let succeeded = self.urls_succeeded.load(Ordering::SeqCst);
        let fetches = self.fetches_total.load(Ordering::SeqCst);
        let fetch_time = self.total_fetch_time_ms.load(Ordering::SeqCst);

        let success_rate = if processed > 0 {
            (succeeded as f64 / processed as f64) * 100.0
        } else {
            0.0
        };

        let avg_fetch_time_ms = if fetches > 0 { fetch_time / fetches } else { 0 };

        RunSummary {
            urls_queued: self.urls_queued.load(Ordering::SeqCst),
            urls_processed: processed,
            urls_succeeded: succeeded,
            urls_failed: self.urls_failed.load(Ordering::SeqCst),
            urls_skipped: self.urls_skipped.load(Ordering::SeqCst),
            fetches_total: fetches,
            fetches_failed: self.fetches_failed.load(Ordering::SeqCst),
            rows_appended: self.rows_appended.load(Ordering::SeqCst),
            cells_appended: self.cells_appended.load(Ordering::SeqCst),
            writes_failed: self.writes_failed.load(Ordering::SeqCst),
            active_workers: self.active_workers.load(Ordering::SeqCst),
            success_rate,
            avg_fetch_time_ms,
            elapsed_seconds: self.start_time.elapsed().as_secs_f64(),
        }
    }
}
