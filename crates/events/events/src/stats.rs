//! Pipeline counters.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by the publisher and its consumer workers.
#[derive(Debug, Default)]
pub struct PublisherStats {
    published: AtomicU64,
    rejected: AtomicU64,
    processed: AtomicU64,
    failed: AtomicU64,
    timed_out: AtomicU64,
}

impl PublisherStats {
    pub(crate) fn record_published(&self) {
        self.published.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_processed(&self) {
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_timed_out(&self) {
        self.timed_out.fetch_add(1, Ordering::Relaxed);
    }

    /// Takes a point-in-time copy of the counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            published: self.published.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            processed: self.processed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            timed_out: self.timed_out.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time pipeline statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Events admitted into a channel.
    pub published: u64,
    /// Publish calls that failed admission.
    pub rejected: u64,
    /// Events every consumer applied successfully.
    pub processed: u64,
    /// Events at least one consumer failed to apply (including timeouts).
    pub failed: u64,
    /// Consumer invocations that hit the per-event deadline.
    pub timed_out: u64,
}

impl StatsSnapshot {
    /// Admitted events not yet finished by the consumers.
    pub fn in_flight(&self) -> u64 {
        self.published
            .saturating_sub(self.processed)
            .saturating_sub(self.failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_flight() {
        let stats = PublisherStats::default();
        stats.record_published();
        stats.record_published();
        stats.record_published();
        stats.record_processed();
        stats.record_failed();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.published, 3);
        assert_eq!(snapshot.in_flight(), 1);
    }
}
