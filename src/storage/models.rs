// storage/models.rs
// Record types and store operation results

use std::time::Duration;

use strum_macros::Display;

/// A contact to be inserted.
///
/// Both fields must be non-empty; the schema rejects empty strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub name: String,
    pub email: String,
}

impl Record {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Record {
            name: name.into(),
            email: email.into(),
        }
    }

    /// The `i`-th synthetic contact: `name-{i}` / `email-{i}@domain.tld`.
    pub fn synthetic(i: usize) -> Self {
        Record {
            name: synthetic_name(i),
            email: synthetic_email(i),
        }
    }
}

/// Name of the `i`-th synthetic contact.
pub fn synthetic_name(i: usize) -> String {
    format!("name-{}", i)
}

/// Email of the `i`-th synthetic contact.
pub fn synthetic_email(i: usize) -> String {
    format!("email-{}@domain.tld", i)
}

/// Lazily yields synthetic contacts `1..=count`.
///
/// Nothing is materialized up front; `batch_insert` pulls one record at a time.
pub fn synthetic_records(count: usize) -> impl Iterator<Item = Record> {
    (1..=count).map(Record::synthetic)
}

/// A persisted contact row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    pub id: i64,
    pub name: String,
    pub email: String,
}

/// Which store operation a latency sample measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Operation {
    Insert,
    Lookup,
}

/// A single timing taken by the store. Transient; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencySample {
    pub operation: Operation,
    /// Rows in the store when the operation finished
    pub record_count: usize,
    pub elapsed: Duration,
}

/// Result of a `batch_insert` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertReport {
    /// Rows inserted by this call
    pub rows: usize,
    /// Transactions committed by this call
    pub batches: usize,
    /// Wall-clock time of the whole call
    pub elapsed: Duration,
    /// Rows in the store afterwards
    pub record_count: usize,
}

impl InsertReport {
    pub fn sample(&self) -> LatencySample {
        LatencySample {
            operation: Operation::Insert,
            record_count: self.record_count,
            elapsed: self.elapsed,
        }
    }
}

/// Result of a point lookup by email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup {
    /// `None` when no row matches
    pub name: Option<String>,
    /// Query execution time only
    pub elapsed: Duration,
    pub record_count: usize,
}

impl Lookup {
    pub fn sample(&self) -> LatencySample {
        LatencySample {
            operation: Operation::Lookup,
            record_count: self.record_count,
            elapsed: self.elapsed,
        }
    }
}

/// Outcome of `create_index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum IndexOutcome {
    #[strum(serialize = "created")]
    Created,
    #[strum(serialize = "already exists")]
    AlreadyExists,
}

/// When the unique email index is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexPolicy {
    /// No index at bootstrap; the caller decides when to call `create_index`.
    /// Bulk loads skip per-row uniqueness checks.
    #[default]
    Deferred,
    /// Build the index at bootstrap so every insert is checked.
    Eager,
}
