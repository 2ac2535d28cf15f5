// storage/mod.rs
// Embedded single-table contact store

pub mod connection;
pub mod models;
pub mod schema;
pub mod store;
#[cfg(test)]
pub(crate) mod test_helpers;

// Re-export commonly used items
pub use models::{
    synthetic_email, synthetic_name, synthetic_records, IndexOutcome, IndexPolicy, InsertReport,
    LatencySample, Lookup, Operation, Record, StoredRecord,
};
pub use store::{RecordStore, StoreOptions};
