//! Sweep failure statistics.
//!
//! Counts the recoverable events of a sweep (ceiling violations, teardown
//! retries, skipped iterations) so they can be summarized at the end.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use strum::IntoEnumIterator;

use super::types::FailureKind;

/// Recoverable failure counters.
///
/// Every `FailureKind` is present from construction, so lookups never miss.
/// Counters are atomic so the teardown retry hook can bump them through a
/// shared reference.
#[derive(Debug)]
pub struct SweepStats {
    failures: HashMap<FailureKind, AtomicUsize>,
}

impl SweepStats {
    pub fn new() -> Self {
        let mut failures = HashMap::new();
        for kind in FailureKind::iter() {
            failures.insert(kind, AtomicUsize::new(0));
        }
        SweepStats { failures }
    }

    /// Increment a failure counter.
    pub fn increment(&self, kind: FailureKind) {
        self.add(kind, 1);
    }

    /// Add `count` to a failure counter.
    pub fn add(&self, kind: FailureKind, count: usize) {
        if let Some(counter) = self.failures.get(&kind) {
            counter.fetch_add(count, Ordering::Relaxed);
        } else {
            log::error!(
                "Failure kind {:?} missing from the stats map. \
                 This indicates a bug in SweepStats initialization.",
                kind
            );
        }
    }

    /// Get the count for a failure kind.
    pub fn get(&self, kind: FailureKind) -> usize {
        self.failures
            .get(&kind)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    /// Total count across all failure kinds.
    pub fn total(&self) -> usize {
        FailureKind::iter().map(|k| self.get(k)).sum()
    }
}

impl Default for SweepStats {
    fn default() -> Self {
        Self::new()
    }
}
