//! The single-table contact store.
//!
//! A `RecordStore` owns one SQLite connection for its whole lifetime. Access is
//! strictly sequential: every operation takes `&mut self` and runs to
//! completion. Once `close` has been called every operation returns
//! `StoreError::InvalidState`.

use std::path::{Path, PathBuf};
use std::time::Instant;

use futures::TryStreamExt;
use log::{debug, info, warn};
use sqlx::{Connection, QueryBuilder, Sqlite, SqliteConnection};

use crate::config::{BATCH_SIZE, EMAIL_INDEX_NAME, MAX_BATCH_SIZE, TABLE_NAME};
use crate::error_handling::StoreError;
use crate::storage::connection::{open_connection, open_in_memory_connection};
use crate::storage::models::{
    IndexOutcome, IndexPolicy, InsertReport, Lookup, Record, StoredRecord,
};
use crate::storage::schema::{self, is_record_violation, is_unique_violation};

/// Options fixed for the lifetime of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    /// Records committed per transaction
    pub batch_size: usize,
    pub index_policy: IndexPolicy,
}

impl Default for StoreOptions {
    fn default() -> Self {
        StoreOptions {
            batch_size: BATCH_SIZE,
            index_policy: IndexPolicy::Deferred,
        }
    }
}

/// Embedded contact store backed by one SQLite file.
pub struct RecordStore {
    conn: Option<SqliteConnection>,
    path: Option<PathBuf>,
    options: StoreOptions,
    /// Rows present, kept current by `batch_insert`
    record_count: usize,
}

impl RecordStore {
    /// Opens (bootstrapping if needed) the store at `path`.
    ///
    /// # Errors
    ///
    /// `StorageUnavailable` if the file cannot be created or opened,
    /// `InvalidState` for a batch size outside `1..=MAX_BATCH_SIZE`.
    pub async fn open(path: impl AsRef<Path>, options: StoreOptions) -> Result<Self, StoreError> {
        validate_options(&options)?;
        let path = path.as_ref();
        let (conn, created) = open_connection(path).await?;
        if created {
            info!("Bootstrapping new store at {}", path.display());
        }
        Self::bootstrap(conn, Some(path.to_path_buf()), options).await
    }

    /// Opens a private in-memory store. Used by tests.
    pub async fn open_in_memory(options: StoreOptions) -> Result<Self, StoreError> {
        validate_options(&options)?;
        let conn = open_in_memory_connection().await?;
        Self::bootstrap(conn, None, options).await
    }

    async fn bootstrap(
        mut conn: SqliteConnection,
        path: Option<PathBuf>,
        options: StoreOptions,
    ) -> Result<Self, StoreError> {
        schema::bootstrap(&mut conn).await?;
        if options.index_policy == IndexPolicy::Eager {
            schema::create_email_index(&mut conn).await?;
        }
        let record_count = count_rows(&mut conn).await?;

        Ok(RecordStore {
            conn: Some(conn),
            path,
            options,
            record_count,
        })
    }

    fn connection(&mut self) -> Result<&mut SqliteConnection, StoreError> {
        self.conn
            .as_mut()
            .ok_or_else(|| StoreError::InvalidState("record store is closed".into()))
    }

    /// Inserts `records` in transactions of `batch_size` rows.
    ///
    /// The input is pulled lazily and at most one batch is buffered. A failed
    /// batch is rolled back; batches committed before it stay persisted, and
    /// the error reports how many rows that was.
    ///
    /// # Errors
    ///
    /// `DuplicateKey` when the unique index rejects a batch, `InvalidRecord`
    /// when a record has an empty field, `StorageUnavailable` otherwise.
    pub async fn batch_insert<I>(&mut self, records: I) -> Result<InsertReport, StoreError>
    where
        I: IntoIterator<Item = Record>,
    {
        let batch_size = self.options.batch_size;
        let conn = self.connection()?;
        info!("Inserting contacts ...");

        let start = Instant::now();
        let mut batch: Vec<Record> = Vec::with_capacity(batch_size);
        let mut rows = 0usize;
        let mut batches = 0usize;

        let mut records = records.into_iter().peekable();
        while records.peek().is_some() {
            batch.extend(records.by_ref().take(batch_size));
            if let Err(e) = commit_batch(conn, &batch).await {
                self.record_count += rows;
                return Err(classify_insert_error(e, rows, batches));
            }
            rows += batch.len();
            batches += 1;
            debug!("Committed batch {} ({} rows total)", batches, rows);
            batch.clear();
        }

        let elapsed = start.elapsed();
        self.record_count += rows;
        info!(
            "Inserted {} rows in {} batches ({:.2} ms)",
            rows,
            batches,
            elapsed.as_secs_f64() * 1000.0
        );

        Ok(InsertReport {
            rows,
            batches,
            elapsed,
            record_count: self.record_count,
        })
    }

    /// Creates the unique email index. Idempotent.
    ///
    /// # Errors
    ///
    /// `IndexCreationFailed` if stored rows already share an email.
    pub async fn create_index(&mut self) -> Result<IndexOutcome, StoreError> {
        let conn = self.connection()?;
        schema::create_email_index(conn).await
    }

    /// Whether the unique email index exists.
    pub async fn has_index(&mut self) -> Result<bool, StoreError> {
        let conn = self.connection()?;
        schema::index_exists(conn, EMAIL_INDEX_NAME).await
    }

    /// Looks up the name stored for `email`.
    ///
    /// Only query execution is timed. A miss is `name: None`, not an error.
    pub async fn lookup(&mut self, email: &str) -> Result<Lookup, StoreError> {
        let record_count = self.record_count;
        let conn = self.connection()?;
        debug!("Looking for email {}", email);

        let sql = format!("SELECT name FROM {TABLE_NAME} WHERE email = ?");
        let start = Instant::now();
        let name: Option<String> = sqlx::query_scalar(&sql)
            .bind(email)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| StoreError::unavailable("lookup failed", e))?;
        let elapsed = start.elapsed();

        match &name {
            Some(name) => debug!("Found name '{}' in {:?}", name, elapsed),
            None => debug!("No contact for {} ({:?})", email, elapsed),
        }

        Ok(Lookup {
            name,
            elapsed,
            record_count,
        })
    }

    /// Counts rows with a query (not the cached count).
    pub async fn len(&mut self) -> Result<usize, StoreError> {
        let conn = self.connection()?;
        count_rows(conn).await
    }

    pub async fn is_empty(&mut self) -> Result<bool, StoreError> {
        Ok(self.len().await? == 0)
    }

    /// Every row, ordered by id.
    pub async fn scan(&mut self) -> Result<Vec<StoredRecord>, StoreError> {
        let conn = self.connection()?;
        let sql = format!("SELECT id, name, email FROM {TABLE_NAME} ORDER BY id");
        sqlx::query_as::<_, (i64, String, String)>(&sql)
            .fetch(&mut *conn)
            .map_ok(|(id, name, email)| StoredRecord { id, name, email })
            .try_collect()
            .await
            .map_err(|e| StoreError::unavailable("scan failed", e))
    }

    /// Closes the connection and waits for SQLite to release it.
    ///
    /// # Errors
    ///
    /// `InvalidState` if the store is already closed.
    pub async fn close(&mut self) -> Result<(), StoreError> {
        let conn = self
            .conn
            .take()
            .ok_or_else(|| StoreError::InvalidState("record store already closed".into()))?;
        conn.close()
            .await
            .map_err(|e| StoreError::unavailable("failed to close connection", e))?;
        debug!("Closed store {}", self.display_path());
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.conn.is_none()
    }

    /// Backing file; `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn options(&self) -> StoreOptions {
        self.options
    }

    /// Rows known to be present without querying.
    pub fn record_count(&self) -> usize {
        self.record_count
    }

    fn display_path(&self) -> String {
        self.path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| ":memory:".to_string())
    }
}

impl Drop for RecordStore {
    fn drop(&mut self) {
        if self.conn.is_some() {
            warn!(
                "Record store {} dropped without close(); its file may stay locked briefly",
                self.display_path()
            );
        }
    }
}

fn validate_options(options: &StoreOptions) -> Result<(), StoreError> {
    if options.batch_size == 0 || options.batch_size > MAX_BATCH_SIZE {
        return Err(StoreError::InvalidState(format!(
            "batch size {} outside 1..={}",
            options.batch_size, MAX_BATCH_SIZE
        )));
    }
    Ok(())
}

async fn count_rows(conn: &mut SqliteConnection) -> Result<usize, StoreError> {
    let sql = format!("SELECT COUNT(*) FROM {TABLE_NAME}");
    let count: i64 = sqlx::query_scalar(&sql)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| StoreError::unavailable("failed to count rows", e))?;
    Ok(count as usize)
}

/// Writes one batch as a single multi-row INSERT inside its own transaction.
/// Dropping the transaction on error rolls the batch back.
async fn commit_batch(conn: &mut SqliteConnection, batch: &[Record]) -> Result<(), sqlx::Error> {
    let mut tx = conn.begin().await?;

    let mut query_builder: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("INSERT INTO {TABLE_NAME} (name, email) "));
    query_builder.push_values(batch, |mut row, record| {
        row.push_bind(record.name.as_str())
            .push_bind(record.email.as_str());
    });
    query_builder.build().execute(&mut *tx).await?;

    tx.commit().await
}

fn classify_insert_error(err: sqlx::Error, committed: usize, batch: usize) -> StoreError {
    if is_unique_violation(&err) {
        warn!(
            "Batch {} rejected by {} after {} committed rows: {}",
            batch, EMAIL_INDEX_NAME, committed, err
        );
        StoreError::DuplicateKey {
            committed,
            batch,
            message: err.to_string(),
        }
    } else if is_record_violation(&err) {
        StoreError::InvalidRecord {
            batch,
            message: err.to_string(),
        }
    } else {
        StoreError::unavailable(format!("insert of batch {} failed", batch), err)
    }
}
