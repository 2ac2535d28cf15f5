//! Application configuration and constants.
//!
//! This module provides:
//! - Canonical constants (batch size, sweep sizes, retry delays, ceilings)
//! - CLI option types and parsing
//! - The explicit `BenchConfig` handed to the sweep driver

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{
    default_time_limits, BenchConfig, ContactsOpt, IndexMode, LogFormat, LogLevel, ReportFormat,
    SweepOpt,
};
