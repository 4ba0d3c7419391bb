use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;

/// Counters shared by the producer and all workers of one run
#[derive(Debug, Clone, Default)]
pub struct SearchMetrics {
    // Producer
    files_enqueued: Arc<AtomicU64>,

    // Workers
    files_scanned: Arc<AtomicU64>,
    bytes_read: Arc<AtomicU64>,
    files_with_matches: Arc<AtomicU64>,
    total_matches: Arc<AtomicU64>,
    errors: Arc<AtomicU64>,
    markers_consumed: Arc<AtomicU64>,
}

impl SearchMetrics {
    /// Creates a new SearchMetrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a path pushed by the producer
    pub fn record_enqueued(&self) {
        self.files_enqueued.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a file a worker finished with, whatever its result
    pub fn record_scanned(&self, bytes: u64) {
        self.files_scanned.fetch_add(1, Ordering::Relaxed);
        self.bytes_read.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Records a file with at least one match
    pub fn record_matches(&self, count: usize) {
        self.files_with_matches.fetch_add(1, Ordering::Relaxed);
        self.total_matches
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_marker(&self) {
        self.markers_consumed.fetch_add(1, Ordering::Relaxed);
    }

    /// Gets a point-in-time copy of the counters
    pub fn get_stats(&self) -> SearchStats {
        SearchStats {
            files_enqueued: self.files_enqueued.load(Ordering::Relaxed),
            files_scanned: self.files_scanned.load(Ordering::Relaxed),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            files_with_matches: self.files_with_matches.load(Ordering::Relaxed),
            total_matches: self.total_matches.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            markers_consumed: self.markers_consumed.load(Ordering::Relaxed),
        }
    }

    /// Logs the current counters
    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            "Search stats:\n\
             Files enqueued/scanned: {}/{}\n\
             Bytes read: {}\n\
             Files with matches: {}\n\
             Total matches: {}\n\
             Errors: {}\n\
             Shutdown markers consumed: {}",
            stats.files_enqueued,
            stats.files_scanned,
            stats.bytes_read,
            stats.files_with_matches,
            stats.total_matches,
            stats.errors,
            stats.markers_consumed
        );
    }
}

/// Snapshot of [`SearchMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub files_enqueued: u64,
    pub files_scanned: u64,
    pub bytes_read: u64,
    pub files_with_matches: u64,
    pub total_matches: u64,
    pub errors: u64,
    pub markers_consumed: u64,
}
