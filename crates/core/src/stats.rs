// Queue counters

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters shared between producers and workers
#[derive(Debug, Default)]
pub(crate) struct QueueStats {
    accepted: AtomicU64,
    rejected: AtomicU64,
    processed: AtomicU64,
    panicked: AtomicU64,
}

impl QueueStats {
    pub(crate) fn record_accepted(&self) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_processed(&self) {
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_panicked(&self) {
        self.panicked.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            accepted: self.accepted.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            processed: self.processed.load(Ordering::Relaxed),
            panicked: self.panicked.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of queue counters
///
/// `processed` counts handler invocations that returned normally; `panicked`
/// counts those that panicked. Both are delivered items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub accepted: u64,
    pub rejected: u64,
    pub processed: u64,
    pub panicked: u64,
}

impl StatsSnapshot {
    /// Items handed to the handler, whatever the outcome
    pub fn delivered(&self) -> u64 {
        self.processed + self.panicked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_counts() {
        let stats = QueueStats::default();
        stats.record_accepted();
        stats.record_accepted();
        stats.record_rejected();
        stats.record_processed();
        stats.record_panicked();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.accepted, 2);
        assert_eq!(snapshot.rejected, 1);
        assert_eq!(snapshot.delivered(), 2);
    }

    #[test]
    fn test_snapshot_serializes() {
        let json = serde_json::to_value(StatsSnapshot::default()).unwrap();
        assert_eq!(json["processed"], 0);
        assert_eq!(json["panicked"], 0);
    }
}
