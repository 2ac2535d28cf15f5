//! Error handling and sweep statistics.
//!
//! This module provides:
//! - The typed store error taxonomy (`StoreError`) and its fatality policy
//! - Initialization errors
//! - Counters for recoverable failures seen during a sweep

mod stats;
mod types;

// Re-export public API
pub use stats::SweepStats;
pub use types::{FailureKind, InitializationError, StoreError};
