//! Database connection setup.
//!
//! The store owns exactly one SQLite connection per file. This module creates
//! the file if needed and opens the connection with WAL journaling.

use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::Path;
use std::str::FromStr;

use log::{error, info};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};
use sqlx::{Connection, SqliteConnection};

use crate::error_handling::StoreError;

/// Opens a connection to the database file at `db_path`, creating the file if
/// it doesn't exist.
///
/// Returns the connection and whether the file was created by this call.
pub async fn open_connection(db_path: &Path) -> Result<(SqliteConnection, bool), StoreError> {
    let created = match OpenOptions::new()
        .read(true)
        .write(true)
        .create_new(true)
        .open(db_path)
    {
        Ok(_) => {
            info!("Database file {} created.", db_path.display());
            true
        }
        Err(ref e) if e.kind() == ErrorKind::AlreadyExists => {
            info!("Database file {} already exists.", db_path.display());
            false
        }
        Err(e) => {
            error!("Failed to create database file {}: {e}", db_path.display());
            return Err(StoreError::unavailable(
                format!("cannot create {}", db_path.display()),
                e,
            ));
        }
    };

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .journal_mode(SqliteJournalMode::Wal);

    let conn = SqliteConnection::connect_with(&options)
        .await
        .map_err(|e| {
            error!("Failed to connect to database {}: {e}", db_path.display());
            StoreError::unavailable(format!("cannot open {}", db_path.display()), e)
        })?;

    Ok((conn, created))
}

/// Opens a private in-memory database.
pub async fn open_in_memory_connection() -> Result<SqliteConnection, StoreError> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .map_err(|e| StoreError::unavailable("invalid in-memory options", e))?;
    SqliteConnection::connect_with(&options)
        .await
        .map_err(|e| StoreError::unavailable("cannot open in-memory database", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_connection_creates_file_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contacts.sqlite3");

        let (conn, created) = open_connection(&path).await.unwrap();
        assert!(created);
        assert!(path.exists());
        conn.close().await.unwrap();

        let (conn, created) = open_connection(&path).await.unwrap();
        assert!(!created);
        conn.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_open_connection_unwritable_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("contacts.sqlite3");

        let result = open_connection(&path).await;
        assert!(matches!(
            result,
            Err(StoreError::StorageUnavailable { .. })
        ));
    }
}
