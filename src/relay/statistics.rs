//! Delivery statistics printing.

use log::info;
use strum::IntoEnumIterator;

use crate::error_handling::{BatchOutcome, DeliveryStats};

/// Prints batch and line counts to the log.
///
/// Outcomes that never happened are left out.
pub fn print_delivery_statistics(stats: &DeliveryStats) {
    let total_batches = stats.total_batches();
    if total_batches > 0 {
        info!("Batch Counts ({} total):", total_batches);
        for outcome in BatchOutcome::iter() {
            let count = stats.batch_count(outcome);
            if count > 0 {
                info!("   {}: {}", outcome.as_str(), count);
            }
        }
    }

    info!(
        "Lines delivered: {}, dropped: {}",
        stats.lines_delivered(),
        stats.lines_dropped()
    );
    if stats.points_rejected() > 0 {
        info!("Points rejected at encode time: {}", stats.points_rejected());
    }
}
