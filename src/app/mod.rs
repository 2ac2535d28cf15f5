//! Application-level helpers used by the binaries.
//!
//! This module provides end-of-sweep summaries and statistics printing.

pub mod statistics;

pub use statistics::{print_single_summary, print_sweep_statistics, print_sweep_summary};
