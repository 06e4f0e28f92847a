//! Run-scoped upload counters.
//!
//! One [`RunMetrics`] is created per run and shared with the workers behind an
//! `Arc`. Every counter is an independent atomic; nothing reads two of them
//! expecting a consistent joint view except the final summary, which is taken
//! after all workers have stopped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct RunMetrics {
    started: Instant,
    uploaded_files: AtomicU64,
    uploaded_bytes: AtomicU64,
    failed_uploads: AtomicU64,
    cancelled_uploads: AtomicU64,
    skipped_paths: AtomicU64,
}

/// Point-in-time copy of [`RunMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub uploaded_files: u64,
    pub uploaded_bytes: u64,
    pub failed_uploads: u64,
    pub cancelled_uploads: u64,
    pub skipped_paths: u64,
    pub elapsed: Duration,
}

impl RunMetrics {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            uploaded_files: AtomicU64::new(0),
            uploaded_bytes: AtomicU64::new(0),
            failed_uploads: AtomicU64::new(0),
            cancelled_uploads: AtomicU64::new(0),
            skipped_paths: AtomicU64::new(0),
        }
    }

    /// Record a successful upload of `bytes`. Returns the running
    /// `(files, bytes)` totals including this one.
    pub fn record_upload(&self, bytes: u64) -> (u64, u64) {
        let total_bytes = self.uploaded_bytes.fetch_add(bytes, Ordering::SeqCst) + bytes;
        let files = self.uploaded_files.fetch_add(1, Ordering::SeqCst) + 1;
        (files, total_bytes)
    }

    pub fn record_failure(&self) {
        self.failed_uploads.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_cancelled(&self) {
        self.cancelled_uploads.fetch_add(1, Ordering::SeqCst);
    }

    /// A discovered path that could not be turned into an upload task.
    pub fn record_skipped(&self) {
        self.skipped_paths.fetch_add(1, Ordering::SeqCst);
    }

    pub fn uploaded_files(&self) -> u64 {
        self.uploaded_files.load(Ordering::SeqCst)
    }

    pub fn uploaded_bytes(&self) -> u64 {
        self.uploaded_bytes.load(Ordering::SeqCst)
    }

    pub fn failed_uploads(&self) -> u64 {
        self.failed_uploads.load(Ordering::SeqCst)
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            uploaded_files: self.uploaded_files(),
            uploaded_bytes: self.uploaded_bytes(),
            failed_uploads: self.failed_uploads(),
            cancelled_uploads: self.cancelled_uploads.load(Ordering::SeqCst),
            skipped_paths: self.skipped_paths.load(Ordering::SeqCst),
            elapsed: self.elapsed(),
        }
    }
}

impl Default for RunMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn record_upload_returns_running_totals() {
        let metrics = RunMetrics::new();
        assert_eq!(metrics.record_upload(100), (1, 100));
        assert_eq!(metrics.record_upload(50), (2, 150));
        assert_eq!(metrics.uploaded_bytes(), 150);
    }

    #[test]
    fn counters_are_shared_across_threads() {
        let metrics = Arc::new(RunMetrics::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let metrics = Arc::clone(&metrics);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        metrics.record_upload(2);
                        metrics.record_failure();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let snap = metrics.snapshot();
        assert_eq!(snap.uploaded_files, 800);
        assert_eq!(snap.uploaded_bytes, 1600);
        assert_eq!(snap.failed_uploads, 800);
    }

    #[test]
    fn fresh_metrics_are_zero() {
        let snap = RunMetrics::default().snapshot();
        assert_eq!(snap.uploaded_files, 0);
        assert_eq!(snap.failed_uploads, 0);
        assert_eq!(snap.cancelled_uploads, 0);
        assert_eq!(snap.skipped_paths, 0);
    }
}
