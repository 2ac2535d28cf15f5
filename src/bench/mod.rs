//! Benchmark orchestration.
//!
//! This module provides:
//! - The size/mode sweep (`BenchmarkDriver`)
//! - The single load-then-lookup run (`run_single`)
//! - Pluggable record sources for the sweep
//! - Store file teardown with retries on transient contention

mod driver;
mod sample;
mod single;
mod source;
pub mod teardown;

pub use driver::BenchmarkDriver;
pub use sample::{BenchmarkSample, SampleStatus, SweepReport};
pub use single::{run_single, SingleRunReport};
pub use source::{RecordSource, SyntheticSource};
pub use teardown::{FileRemover, FsRemover, TeardownPolicy};
