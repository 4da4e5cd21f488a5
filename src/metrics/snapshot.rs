use serde::{Deserialize, Serialize};

/// Point-in-time view of a run, also used as the final summary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub urls_queued: u64,
    pub urls_processed: u64,
    pub urls_succeeded: u64,
    pub urls_failed: u64,
    pub urls_skipped: u64,
    pub fetches_total: u64,
    pub fetches_failed: u64,
    pub rows_appended: u64,
    pub cells_appended: u64,
    pub writes_failed: u64,
    pub active_workers: u64,
    pub success_rate: f64,
    pub avg_fetch_time_ms: u64,
    pub elapsed_seconds: f64,
}
