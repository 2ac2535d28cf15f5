//! One load-then-lookup run against a persistent store.

use std::path::Path;
use std::time::Duration;

use log::info;

use crate::config::IndexMode;
use crate::error_handling::StoreError;
use crate::storage::{
    synthetic_email, synthetic_records, IndexOutcome, IndexPolicy, RecordStore, StoreOptions,
};
use crate::utils::duration_as_ms;

/// What `run_single` measured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingleRunReport {
    pub inserted: usize,
    pub insert_elapsed: Duration,
    /// `None` in `no-index` mode
    pub index_outcome: Option<IndexOutcome>,
    /// Name stored under the last inserted email, if any
    pub found_name: Option<String>,
    pub lookup_elapsed: Duration,
}

/// Bootstraps the store at `path` (reusing an existing file), inserts `count`
/// synthetic records, optionally builds the email index, then looks up the
/// last inserted email.
///
/// The file is not removed afterwards. Running twice against the same file
/// appends a second copy of each record, so `with-index` mode then fails with
/// `IndexCreationFailed` (or `DuplicateKey` once the index exists).
pub async fn run_single(
    path: &Path,
    count: usize,
    mode: IndexMode,
    batch_size: usize,
) -> Result<SingleRunReport, StoreError> {
    let mut store = RecordStore::open(
        path,
        StoreOptions {
            batch_size,
            index_policy: IndexPolicy::Deferred,
        },
    )
    .await?;

    let result = load_and_probe(&mut store, count, mode).await;
    store.close().await?;
    let report = result?;

    info!(
        "Inserted {} records in {:.2}ms; lookup took {:.4}ms",
        report.inserted,
        duration_as_ms(report.insert_elapsed),
        duration_as_ms(report.lookup_elapsed)
    );
    Ok(report)
}

async fn load_and_probe(
    store: &mut RecordStore,
    count: usize,
    mode: IndexMode,
) -> Result<SingleRunReport, StoreError> {
    // An index built before the load would check every insert; build it after.
    let insert = store.batch_insert(synthetic_records(count)).await?;

    let index_outcome = match mode {
        IndexMode::WithIndex => Some(store.create_index().await?),
        IndexMode::NoIndex => None,
    };

    let lookup = store.lookup(&synthetic_email(count)).await?;

    Ok(SingleRunReport {
        inserted: insert.rows,
        insert_elapsed: insert.elapsed,
        index_outcome,
        found_name: lookup.name,
        lookup_elapsed: lookup.elapsed,
    })
}
