//! contact_bench library: a single-table SQLite contact store and the
//! benchmark that measures it.
//!
//! The store (`RecordStore`) owns one connection to one file. It bootstraps the
//! `contacts` table, inserts records in batched transactions, builds a unique
//! index on `email` on request and answers point lookups by email. The
//! benchmark (`BenchmarkDriver`) runs a full store lifecycle per record count,
//! with and without the index, and reports insert and lookup latencies.
//!
//! # Example
//!
//! ```no_run
//! use contact_bench::{synthetic_records, RecordStore, StoreOptions};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut store = RecordStore::open("contacts.sqlite3", StoreOptions::default()).await?;
//! store.batch_insert(synthetic_records(2)).await?;
//! store.create_index().await?;
//!
//! let lookup = store.lookup("email-2@domain.tld").await?;
//! assert_eq!(lookup.name.as_deref(), Some("name-2"));
//! store.close().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! All store operations are async and need a Tokio runtime.

pub mod app;
pub mod bench;
pub mod config;
pub mod error_handling;
pub mod initialization;
pub mod report;
pub mod storage;
pub mod utils;

// Re-export public API
pub use bench::{
    run_single, BenchmarkDriver, BenchmarkSample, RecordSource, SampleStatus, SingleRunReport,
    SweepReport, SyntheticSource,
};
pub use config::{BenchConfig, ContactsOpt, IndexMode, LogFormat, LogLevel, ReportFormat, SweepOpt};
pub use error_handling::{FailureKind, StoreError, SweepStats};
pub use report::{ReportRow, ResultReporter};
pub use storage::{
    synthetic_email, synthetic_name, synthetic_records, IndexOutcome, IndexPolicy, Lookup, Record,
    RecordStore, StoreOptions,
};
