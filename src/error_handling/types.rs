//! Error type definitions.
//!
//! This module defines the store error taxonomy, initialization errors, and the
//! recoverable failure kinds counted during a sweep.

use std::path::PathBuf;

use log::SetLoggerError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),
}

/// Failures surfaced by the record store and the teardown step.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The engine cannot open or use the database file or connection.
    #[error("Storage unavailable: {context}")]
    StorageUnavailable {
        context: String,
        #[source]
        source: BoxError,
    },

    /// A batch violated the unique email index. Earlier batches stay committed.
    #[error("Duplicate key in batch {batch} ({committed} rows already committed): {message}")]
    DuplicateKey {
        /// Rows committed before the rejected batch
        committed: usize,
        /// Zero-based index of the rejected batch
        batch: usize,
        message: String,
    },

    /// Existing rows prevent the unique index from being built.
    #[error("Failed to create index {index}: {message}")]
    IndexCreationFailed { index: String, message: String },

    /// A record broke a schema check (empty name or email).
    #[error("Invalid record in batch {batch}: {message}")]
    InvalidRecord { batch: usize, message: String },

    /// Operation on a closed store, or a configuration that cannot run.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The store file stayed busy through every teardown attempt.
    #[error("Teardown of {} still contended after {attempts} attempts", path.display())]
    TeardownContention {
        path: PathBuf,
        attempts: usize,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    /// Wraps an engine or filesystem error as `StorageUnavailable`.
    pub fn unavailable(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        StoreError::StorageUnavailable {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Whether the sweep must stop on this error.
    ///
    /// Duplicate keys, unbuildable indexes and rejected records only cost the
    /// current size/mode pair.
    pub fn is_fatal(&self) -> bool {
        match self {
            StoreError::StorageUnavailable { .. }
            | StoreError::InvalidState(_)
            | StoreError::TeardownContention { .. } => true,
            StoreError::DuplicateKey { .. }
            | StoreError::IndexCreationFailed { .. }
            | StoreError::InvalidRecord { .. } => false,
        }
    }

    /// The sweep counter this error feeds, if it is recoverable.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            StoreError::DuplicateKey { .. } => Some(FailureKind::DuplicateKey),
            StoreError::IndexCreationFailed { .. } => Some(FailureKind::IndexCreationFailed),
            StoreError::InvalidRecord { .. } => Some(FailureKind::InvalidRecord),
            _ => None,
        }
    }
}

/// Recoverable events counted over a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum FailureKind {
    /// An iteration took longer than its size's ceiling
    CeilingExceeded,
    /// A teardown attempt hit a busy file and was retried
    TeardownRetry,
    /// A batch was rejected by the unique index
    DuplicateKey,
    /// Index creation failed on existing duplicates
    IndexCreationFailed,
    /// A record was rejected by a schema check
    InvalidRecord,
    /// A lookup for a key that was inserted came back empty
    LookupMiss,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::CeilingExceeded => "Time ceiling exceeded",
            FailureKind::TeardownRetry => "Teardown retried",
            FailureKind::DuplicateKey => "Duplicate key",
            FailureKind::IndexCreationFailed => "Index creation failed",
            FailureKind::InvalidRecord => "Invalid record",
            FailureKind::LookupMiss => "Lookup miss",
        }
    }
}
