//! Delivery statistics tracking.
//!
//! Thread-safe counters for what happened to each flushed batch and how many
//! lines went out or were lost.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use strum::IntoEnumIterator;

use super::types::BatchOutcome;

/// Thread-safe delivery statistics tracker.
///
/// Every `BatchOutcome` is initialized to zero on creation, so lookups never
/// miss. Share it across tasks with `Arc`.
pub struct DeliveryStats {
    batches: HashMap<BatchOutcome, AtomicUsize>,
    lines_delivered: AtomicUsize,
    lines_dropped: AtomicUsize,
    points_rejected: AtomicUsize,
}

impl DeliveryStats {
    pub fn new() -> Self {
        let mut batches = HashMap::new();
        for outcome in BatchOutcome::iter() {
            batches.insert(outcome, AtomicUsize::new(0));
        }

        DeliveryStats {
            batches,
            lines_delivered: AtomicUsize::new(0),
            lines_dropped: AtomicUsize::new(0),
            points_rejected: AtomicUsize::new(0),
        }
    }

    /// Records the outcome of one batch of `lines` lines.
    pub fn record(&self, outcome: BatchOutcome, lines: usize) {
        if let Some(counter) = self.batches.get(&outcome) {
            counter.fetch_add(1, Ordering::Relaxed);
        } else {
            log::error!(
                "Attempted to record batch outcome {:?} which is not in the map. \
                 This indicates a bug in DeliveryStats initialization.",
                outcome
            );
        }

        match outcome {
            BatchOutcome::Delivered => {
                self.lines_delivered.fetch_add(lines, Ordering::Relaxed);
            }
            BatchOutcome::Dropped | BatchOutcome::Rejected => {
                self.lines_dropped.fetch_add(lines, Ordering::Relaxed);
            }
            BatchOutcome::Skipped => {}
        }
    }

    /// Records points that failed to encode and were left out of a batch.
    pub fn record_rejected_points(&self, count: usize) {
        self.points_rejected.fetch_add(count, Ordering::Relaxed);
    }

    /// Number of batches that ended with `outcome`.
    pub fn batch_count(&self, outcome: BatchOutcome) -> usize {
        self.batches
            .get(&outcome)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    pub fn lines_delivered(&self) -> usize {
        self.lines_delivered.load(Ordering::SeqCst)
    }

    pub fn lines_dropped(&self) -> usize {
        self.lines_dropped.load(Ordering::SeqCst)
    }

    pub fn points_rejected(&self) -> usize {
        self.points_rejected.load(Ordering::SeqCst)
    }

    /// Total number of batches that reached the sink, including empty ones.
    pub fn total_batches(&self) -> usize {
        self.batches.values().map(|c| c.load(Ordering::SeqCst)).sum()
    }
}

impl Default for DeliveryStats {
    fn default() -> Self {
        Self::new()
    }
}
