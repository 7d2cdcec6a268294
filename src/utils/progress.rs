//! # Progress Tracking
//!
//! A minimal atomic progress counter for the streaming loop. Counters use
//! relaxed ordering since only eventual visibility matters; reporting goes
//! through `tracing` at decile boundaries rather than per update, so the
//! hot loop pays one `fetch_add` per position.

use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// Tracks processed units against a known total
pub struct Progress {
    total: u64,
    done: AtomicU64,
    next_report: AtomicU64,
}

impl Progress {
    /// Create a tracker for `total` units of work
    pub fn new(total: u64) -> Self {
        Self {
            total,
            done: AtomicU64::new(0),
            next_report: AtomicU64::new(total.div_ceil(10).max(1)),
        }
    }

    /// Record `n` finished units, reporting when a decile is crossed
    pub fn inc(&self, n: u64) {
        let done = self.done.fetch_add(n, Ordering::Relaxed) + n;
        let threshold = self.next_report.load(Ordering::Relaxed);
        if done >= threshold && self.total > 0 {
            let step = self.total.div_ceil(10).max(1);
            if self
                .next_report
                .compare_exchange(threshold, threshold + step, Ordering::Relaxed, Ordering::Relaxed)
                .is_ok()
            {
                let percent = (done * 100 / self.total).min(100);
                info!(done, total = self.total, "processed {percent}%");
            }
        }
    }

    /// Units recorded so far
    pub fn done(&self) -> u64 {
        self.done.load(Ordering::Relaxed)
    }
}
