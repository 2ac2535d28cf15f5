//! Shared test helpers for storage module tests.
//!
//! This module provides common utilities for store setup and test data creation
//! used across storage module tests.

use crate::storage::{Record, RecordStore, StoreOptions};

/// Opens an in-memory store with default options.
/// Uses an in-memory database for fast test execution.
pub async fn open_test_store() -> RecordStore {
    RecordStore::open_in_memory(StoreOptions::default())
        .await
        .expect("Failed to open in-memory store")
}

/// Two contacts sharing one email.
pub fn duplicate_email_records() -> Vec<Record> {
    vec![
        Record::new("name-1", "shared@domain.tld"),
        Record::new("name-2", "shared@domain.tld"),
    ]
}
