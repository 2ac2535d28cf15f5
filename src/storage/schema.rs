// storage/schema.rs
// Table bootstrap and the unique email index

use log::{debug, info};
use sqlx::SqliteConnection;

use crate::config::{EMAIL_INDEX_NAME, TABLE_NAME};
use crate::error_handling::StoreError;
use crate::storage::models::IndexOutcome;

/// Creates the contacts table if it is missing. Never creates the index.
pub async fn bootstrap(conn: &mut SqliteConnection) -> Result<(), StoreError> {
    let sql = format!(
        "CREATE TABLE IF NOT EXISTS {TABLE_NAME} (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL CHECK (length(name) > 0),
            email TEXT NOT NULL CHECK (length(email) > 0)
        )"
    );
    sqlx::query(&sql)
        .execute(&mut *conn)
        .await
        .map_err(|e| StoreError::unavailable("failed to create contacts table", e))?;
    debug!("Table {} ready", TABLE_NAME);
    Ok(())
}

/// Whether an index named `name` exists.
pub async fn index_exists(conn: &mut SqliteConnection, name: &str) -> Result<bool, StoreError> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name = ?")
            .bind(name)
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| StoreError::unavailable("failed to read sqlite_master", e))?;
    Ok(count > 0)
}

/// Builds the unique email index unless it already exists.
///
/// Fails with `IndexCreationFailed` when existing rows share an email.
pub async fn create_email_index(conn: &mut SqliteConnection) -> Result<IndexOutcome, StoreError> {
    if index_exists(conn, EMAIL_INDEX_NAME).await? {
        info!("Index {} already exists", EMAIL_INDEX_NAME);
        return Ok(IndexOutcome::AlreadyExists);
    }

    let sql = format!("CREATE UNIQUE INDEX {EMAIL_INDEX_NAME} ON {TABLE_NAME}(email)");
    match sqlx::query(&sql).execute(&mut *conn).await {
        Ok(_) => {
            info!("Index {} created", EMAIL_INDEX_NAME);
            Ok(IndexOutcome::Created)
        }
        Err(e) if is_unique_violation(&e) => Err(StoreError::IndexCreationFailed {
            index: EMAIL_INDEX_NAME.to_string(),
            message: e.to_string(),
        }),
        Err(e) => Err(StoreError::unavailable(
            format!("failed to create index {}", EMAIL_INDEX_NAME),
            e,
        )),
    }
}

/// Whether `err` is SQLite rejecting a duplicate value under a unique constraint.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => {
            db.is_unique_violation() || db.message().contains("UNIQUE constraint failed")
        }
        _ => false,
    }
}

/// Whether `err` is a CHECK or NOT NULL constraint rejecting a row.
pub(crate) fn is_record_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => {
            db.is_check_violation()
                || db.message().contains("CHECK constraint failed")
                || db.message().contains("NOT NULL constraint failed")
        }
        _ => false,
    }
}
