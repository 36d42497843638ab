// Process-wide analysis counters (served on /api/stats, logged per batch)

use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct AnalysisStats {
    pub batches_total: AtomicU64,
    pub posts_processed_total: AtomicU64,
    pub results_emitted_total: AtomicU64,
    /// Shared with the retry policy, which bumps it on every rate-limited call.
    pub rate_limited_total: Arc<AtomicU64>,
    pub failed_batches_total: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub batches_total: u64,
    pub posts_processed_total: u64,
    pub results_emitted_total: u64,
    pub rate_limited_total: u64,
    pub failed_batches_total: u64,
}

impl AnalysisStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            batches_total: self.batches_total.load(Ordering::Relaxed),
            posts_processed_total: self.posts_processed_total.load(Ordering::Relaxed),
            results_emitted_total: self.results_emitted_total.load(Ordering::Relaxed),
            rate_limited_total: self.rate_limited_total.load(Ordering::Relaxed),
            failed_batches_total: self.failed_batches_total.load(Ordering::Relaxed),
        }
    }
}
