//! Statistics printing.

use log::info;
use strum::IntoEnumIterator;

use crate::bench::{SingleRunReport, SweepReport};
use crate::error_handling::{FailureKind, SweepStats};
use crate::utils::format_duration;

/// Logs every non-zero failure counter.
pub fn print_sweep_statistics(stats: &SweepStats) {
    let total = stats.total();
    if total == 0 {
        return;
    }

    info!("Failure Counts ({} total):", total);
    for kind in FailureKind::iter() {
        let count = stats.get(kind);
        if count > 0 {
            info!("   {}: {}", kind.as_str(), count);
        }
    }
}

/// Prints a one-line summary of the sweep.
pub fn print_sweep_summary(report: &SweepReport) {
    let flagged = report.flagged().count();
    info!(
        "✅ Ran {} iteration{} ({} flagged, {} skipped) in {}",
        report.samples.len(),
        if report.samples.len() == 1 { "" } else { "s" },
        flagged,
        report.skipped.len(),
        format_duration(report.elapsed)
    );
}

/// Prints the outcome of a single run.
pub fn print_single_summary(report: &SingleRunReport) {
    info!(
        "Inserted {} record{} in {}",
        report.inserted,
        if report.inserted == 1 { "" } else { "s" },
        format_duration(report.insert_elapsed)
    );
    if let Some(outcome) = report.index_outcome {
        info!("Email index {}", outcome);
    }
    match &report.found_name {
        Some(name) => info!(
            "Lookup found {} in {}",
            name,
            format_duration(report.lookup_elapsed)
        ),
        None => info!(
            "Lookup found nothing in {}",
            format_duration(report.lookup_elapsed)
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_print_sweep_statistics_no_failures() {
        let stats = SweepStats::new();
        // Should not panic when nothing was counted
        print_sweep_statistics(&stats);
    }

    #[test]
    fn test_print_sweep_statistics_with_failures() {
        let stats = SweepStats::new();
        stats.increment(FailureKind::CeilingExceeded);
        stats.add(FailureKind::TeardownRetry, 2);
        print_sweep_statistics(&stats);
        assert_eq!(stats.total(), 3);
    }

    #[test]
    fn test_print_summaries() {
        let report = SweepReport {
            samples: Vec::new(),
            skipped: Vec::new(),
            stats: SweepStats::new(),
            elapsed: Duration::from_millis(5),
        };
        print_sweep_summary(&report);

        print_single_summary(&SingleRunReport {
            inserted: 1,
            insert_elapsed: Duration::from_micros(300),
            index_outcome: None,
            found_name: Some("name-1".to_string()),
            lookup_elapsed: Duration::from_micros(20),
        });
    }
}
