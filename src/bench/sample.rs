//! Benchmark results produced by the driver.

use std::fmt;
use std::time::Duration;

use crate::config::IndexMode;
use crate::error_handling::SweepStats;
use crate::report::ReportRow;
use crate::storage::{LatencySample, Operation};
use crate::utils::duration_as_ms;

/// How a benchmark iteration ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleStatus {
    Ok,
    /// The iteration ran longer than the ceiling configured for its size
    CeilingExceeded { limit: Duration },
    /// A batch was rejected; only `committed` rows were inserted
    PartialInsert { committed: usize },
}

impl SampleStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, SampleStatus::Ok)
    }
}

impl fmt::Display for SampleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleStatus::Ok => f.write_str("ok"),
            SampleStatus::CeilingExceeded { limit } => {
                write!(f, "exceeded {}ms limit", limit.as_millis())
            }
            SampleStatus::PartialInsert { committed } => {
                write!(f, "partial insert ({} rows)", committed)
            }
        }
    }
}

/// Measurements for one (size, mode) iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkSample {
    pub size: usize,
    pub mode: IndexMode,
    /// Rows actually present when lookups ran
    pub rows: usize,
    pub insert_elapsed: Duration,
    /// Index build time, `with-index` mode only
    pub index_elapsed: Option<Duration>,
    /// Mean of the per-lookup query times
    pub lookup_mean: Duration,
    pub lookups: usize,
    /// Lookups for an inserted key that returned nothing
    pub lookup_misses: usize,
    /// Open through close
    pub total_elapsed: Duration,
    pub status: SampleStatus,
}

impl BenchmarkSample {
    pub fn insert_sample(&self) -> LatencySample {
        LatencySample {
            operation: Operation::Insert,
            record_count: self.rows,
            elapsed: self.insert_elapsed,
        }
    }

    pub fn lookup_sample(&self) -> LatencySample {
        LatencySample {
            operation: Operation::Lookup,
            record_count: self.rows,
            elapsed: self.lookup_mean,
        }
    }

    pub fn to_row(&self) -> ReportRow {
        ReportRow {
            size: self.size,
            mode: self.mode,
            insert_latency_ms: duration_as_ms(self.insert_elapsed),
            lookup_latency_ms: duration_as_ms(self.lookup_mean),
            index_latency_ms: self.index_elapsed.map(duration_as_ms),
            total_ms: duration_as_ms(self.total_elapsed),
            passed: self.status.is_ok(),
            status: self.status.to_string(),
        }
    }
}

/// Everything a sweep produced.
#[derive(Debug)]
pub struct SweepReport {
    /// Size-ascending, grouped by mode within each size
    pub samples: Vec<BenchmarkSample>,
    /// Size/mode pairs dropped after a recoverable error
    pub skipped: Vec<(usize, IndexMode)>,
    pub stats: SweepStats,
    pub elapsed: Duration,
}

impl SweepReport {
    /// Rows for the reporter, in sample order.
    pub fn rows(&self) -> Vec<ReportRow> {
        self.samples.iter().map(BenchmarkSample::to_row).collect()
    }

    /// Samples that did not end `Ok`.
    pub fn flagged(&self) -> impl Iterator<Item = &BenchmarkSample> {
        self.samples.iter().filter(|s| !s.status.is_ok())
    }
}
