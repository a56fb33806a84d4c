//! Thread-safe download statistics for one pipeline run.
//!
//! All mutation goes through the aggregator's methods; the raw counters are
//! never exposed. `success + failed <= total` holds at every instant, with
//! equality once every discovered asset has reached a terminal state.

use serde::Serialize;
use std::sync::Mutex;

/// One asset that exhausted its attempts (or hit the placeholder filter).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedItem {
    pub scenario: String,
    pub asset: String,
}

/// Immutable point-in-time copy of the counters, safe to hand to the
/// presentation layer or serialize into the end-of-run report.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatsSnapshot {
    pub total: u64,
    pub success: u64,
    pub failed: u64,
    pub failed_items: Vec<FailedItem>,
}

#[derive(Debug, Default)]
struct Counters {
    total: u64,
    success: u64,
    failed: u64,
    failed_items: Vec<FailedItem>,
}

/// Aggregator shared between discovery (which counts discovered assets) and
/// the fetch tasks (which count terminal outcomes).
#[derive(Debug, Default)]
pub struct StatsAggregator {
    inner: Mutex<Counters>,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `n` newly discovered assets.
    pub fn add_discovered(&self, n: u64) {
        self.inner.lock().unwrap().total += n;
    }

    pub fn add_success(&self) {
        self.inner.lock().unwrap().success += 1;
    }

    pub fn add_failure(&self, scenario: &str, asset: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.failed += 1;
        inner.failed_items.push(FailedItem {
            scenario: scenario.to_string(),
            asset: asset.to_string(),
        });
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let inner = self.inner.lock().unwrap();
        StatsSnapshot {
            total: inner.total,
            success: inner.success,
            failed: inner.failed,
            failed_items: inner.failed_items.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn counts_and_snapshot() {
        let stats = StatsAggregator::new();
        stats.add_discovered(3);
        stats.add_success();
        stats.add_success();
        stats.add_failure("scenario1", "c.png");

        let snap = stats.snapshot();
        assert_eq!(snap.total, 3);
        assert_eq!(snap.success, 2);
        assert_eq!(snap.failed, 1);
        assert_eq!(
            snap.failed_items,
            vec![FailedItem {
                scenario: "scenario1".into(),
                asset: "c.png".into(),
            }]
        );
    }

    #[test]
    fn snapshot_is_detached() {
        let stats = StatsAggregator::new();
        stats.add_discovered(1);
        let snap = stats.snapshot();
        stats.add_success();
        assert_eq!(snap.success, 0);
        assert_eq!(stats.snapshot().success, 1);
    }

    #[test]
    fn concurrent_increments_are_not_lost() {
        let stats = Arc::new(StatsAggregator::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let stats = Arc::clone(&stats);
            handles.push(std::thread::spawn(move || {
                for _ in 0..1000 {
                    stats.add_success();
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(stats.snapshot().success, 8000);
    }
}
