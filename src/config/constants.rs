//! Configuration constants.
//!
//! Canonical values for the store layout, batching, the benchmark sweep and
//! teardown retries. `BenchConfig::default()` is built from these.

use std::time::Duration;

/// Default location of the benchmark database file (relative to the working directory).
pub const DB_PATH: &str = "contacts.sqlite3";

/// The single table managed by the store.
pub const TABLE_NAME: &str = "contacts";

/// Name of the unique index over `contacts(email)`.
pub const EMAIL_INDEX_NAME: &str = "index_contacts_email";

/// Records committed per transaction.
///
/// Committing every row serializes on WAL flushes; a thousand rows per commit keeps
/// memory bounded while amortizing commit cost.
pub const BATCH_SIZE: usize = 1000;

/// Upper bound on a single batch. Each row binds two parameters and the whole
/// batch goes out as one multi-row INSERT, so this stays well under SQLite's
/// 32766 bound-parameter limit.
pub const MAX_BATCH_SIZE: usize = 16_000;

/// Record counts exercised by a default sweep, ascending.
pub const SWEEP_SIZES: &[usize] = &[10, 100, 1_000, 10_000, 50_000, 100_000, 1_000_000];

/// Point lookups issued per benchmark iteration.
pub const LOOKUPS_PER_ITERATION: usize = 100;

/// Total attempts to delete the store file before giving up.
pub const TEARDOWN_MAX_ATTEMPTS: usize = 3;

/// Delay between teardown attempts.
pub const TEARDOWN_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Pause after closing a store, before the next teardown.
///
/// Heuristic only: SQLite may hold file handles briefly after a logical close.
pub const HANDLE_RELEASE_DELAY: Duration = Duration::from_millis(100);

/// Per-size wall-clock ceilings in milliseconds, `(size, max_ms)`.
pub const TIME_LIMITS_MS: &[(usize, u64)] = &[
    (10, 100),
    (100, 200),
    (1_000, 500),
    (10_000, 1_000),
    (50_000, 3_000),
    (100_000, 5_000),
    (1_000_000, 30_000),
];

/// Suffixes of the files SQLite keeps next to a WAL-mode database.
pub const SIDECAR_SUFFIXES: &[&str] = &["-wal", "-shm"];
