//! Store file teardown with bounded retries.
//!
//! SQLite can keep a file handle for a moment after the connection is closed,
//! especially right after a large WAL flush. Deleting the file in that window
//! fails with a "busy" error that clears on its own, so busy failures are
//! retried on a fixed interval. Any other failure is fatal at once.

use std::cell::Cell;
use std::ffi::OsString;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, warn};
use tokio_retry::strategy::FixedInterval;
use tokio_retry::RetryIf;

use crate::config::SIDECAR_SUFFIXES;
use crate::error_handling::{FailureKind, StoreError, SweepStats};

#[cfg(unix)]
const BUSY_OS_ERRORS: &[i32] = &[16, 26]; // EBUSY, ETXTBSY
#[cfg(windows)]
const BUSY_OS_ERRORS: &[i32] = &[32, 33]; // ERROR_SHARING_VIOLATION, ERROR_LOCK_VIOLATION
#[cfg(not(any(unix, windows)))]
const BUSY_OS_ERRORS: &[i32] = &[];

/// Deletes files. The driver goes through this so tests can inject contention.
pub trait FileRemover {
    fn remove(&self, path: &Path) -> io::Result<()>;
}

/// Removes files from the real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsRemover;

impl FileRemover for FsRemover {
    fn remove(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_file(path)
    }
}

impl<R: FileRemover + ?Sized> FileRemover for &R {
    fn remove(&self, path: &Path) -> io::Result<()> {
        (**self).remove(path)
    }
}

/// How hard to try before declaring the file contended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeardownPolicy {
    /// Total attempts, first try included
    pub attempts: usize,
    pub delay: Duration,
}

/// Whether `err` is a busy/locked condition that may clear by itself.
///
/// Windows reports deleting a file another handle still has open as access
/// denied, so there `PermissionDenied` counts as busy. On Unix it means the
/// directory is not writable and fails at once.
pub fn is_transient_busy(err: &io::Error) -> bool {
    if cfg!(windows) && err.kind() == ErrorKind::PermissionDenied {
        return true;
    }
    err.raw_os_error()
        .map(|code| BUSY_OS_ERRORS.contains(&code))
        .unwrap_or(false)
}

/// An error `is_transient_busy` accepts on this platform.
#[cfg(test)]
pub(crate) fn busy_error() -> io::Error {
    match BUSY_OS_ERRORS.first() {
        Some(&code) => io::Error::from_raw_os_error(code),
        None => io::Error::new(ErrorKind::Other, "busy"),
    }
}

/// The database file followed by its WAL sidecars.
pub fn store_files(db_path: &Path) -> Vec<PathBuf> {
    let mut files = vec![db_path.to_path_buf()];
    for suffix in SIDECAR_SUFFIXES {
        let mut name = OsString::from(db_path.as_os_str());
        name.push(suffix);
        files.push(PathBuf::from(name));
    }
    files
}

/// Deletes the store file and its sidecars, retrying busy failures.
///
/// Missing files are fine. Retries are counted in `stats`.
///
/// # Errors
///
/// `TeardownContention` once `policy.attempts` busy failures pile up on one
/// file, `StorageUnavailable` for any other I/O error.
pub async fn remove_store_files<R: FileRemover>(
    db_path: &Path,
    remover: &R,
    policy: TeardownPolicy,
    stats: &SweepStats,
) -> Result<(), StoreError> {
    for file in store_files(db_path) {
        remove_with_retry(&file, remover, policy, stats).await?;
    }
    Ok(())
}

async fn remove_with_retry<R: FileRemover>(
    path: &Path,
    remover: &R,
    policy: TeardownPolicy,
    stats: &SweepStats,
) -> Result<(), StoreError> {
    let attempts = Cell::new(0usize);
    let strategy = FixedInterval::new(policy.delay).take(policy.attempts.saturating_sub(1));

    let result = RetryIf::start(
        strategy,
        || {
            let attempt = attempts.get() + 1;
            attempts.set(attempt);
            if attempt > 1 {
                warn!(
                    "Retrying deletion of {} (attempt {}/{})",
                    path.display(),
                    attempt,
                    policy.attempts
                );
            }
            let outcome = match remover.remove(path) {
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                other => other,
            };
            async move { outcome }
        },
        |e: &io::Error| is_transient_busy(e),
    )
    .await;

    let used = attempts.get();
    if used > 1 {
        stats.add(FailureKind::TeardownRetry, used - 1);
    }

    match result {
        Ok(()) => {
            debug!("Removed {} after {} attempt(s)", path.display(), used);
            Ok(())
        }
        Err(e) if is_transient_busy(&e) => Err(StoreError::TeardownContention {
            path: path.to_path_buf(),
            attempts: used,
            source: e,
        }),
        Err(e) => Err(StoreError::unavailable(
            format!("cannot delete {}", path.display()),
            e,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Fails the first `busy_failures` removals with a busy error, then delegates to the filesystem.
    struct FlakyRemover {
        busy_failures: usize,
        calls: RefCell<Vec<PathBuf>>,
    }

    impl FileRemover for FlakyRemover {
        fn remove(&self, path: &Path) -> io::Result<()> {
            let mut calls = self.calls.borrow_mut();
            calls.push(path.to_path_buf());
            if calls.len() <= self.busy_failures {
                return Err(busy_error());
            }
            FsRemover.remove(path)
        }
    }

    fn fast_policy(attempts: usize) -> TeardownPolicy {
        TeardownPolicy {
            attempts,
            delay: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_store_files_include_sidecars() {
        let files = store_files(Path::new("contacts.sqlite3"));
        assert_eq!(
            files,
            vec![
                PathBuf::from("contacts.sqlite3"),
                PathBuf::from("contacts.sqlite3-wal"),
                PathBuf::from("contacts.sqlite3-shm"),
            ]
        );
    }

    #[test]
    fn test_is_transient_busy() {
        assert!(!is_transient_busy(&io::Error::new(ErrorKind::NotFound, "gone")));
        assert!(!is_transient_busy(&io::Error::new(ErrorKind::Other, "disk")));
        if cfg!(unix) {
            assert!(is_transient_busy(&io::Error::from_raw_os_error(16)));
            assert!(is_transient_busy(&io::Error::from_raw_os_error(26)));
            assert!(!is_transient_busy(&io::Error::from_raw_os_error(13)));
            assert!(!is_transient_busy(&io::Error::new(
                ErrorKind::PermissionDenied,
                "read-only directory"
            )));
        }
        if cfg!(windows) {
            assert!(is_transient_busy(&io::Error::new(
                ErrorKind::PermissionDenied,
                "in use"
            )));
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_permission_denied_fails_without_retry() {
        struct ReadOnlyDir {
            calls: RefCell<usize>,
        }
        impl FileRemover for ReadOnlyDir {
            fn remove(&self, _path: &Path) -> io::Result<()> {
                *self.calls.borrow_mut() += 1;
                Err(io::Error::new(ErrorKind::PermissionDenied, "read-only directory"))
            }
        }

        let remover = ReadOnlyDir {
            calls: RefCell::new(0),
        };
        let stats = SweepStats::new();
        let err = remove_store_files(
            Path::new("contacts.sqlite3"),
            &remover,
            fast_policy(3),
            &stats,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, StoreError::StorageUnavailable { .. }));
        assert_eq!(*remover.calls.borrow(), 1);
        assert_eq!(stats.get(FailureKind::TeardownRetry), 0);
    }

    #[tokio::test]
    async fn test_missing_files_are_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let stats = SweepStats::new();
        remove_store_files(&dir.path().join("absent.sqlite3"), &FsRemover, fast_policy(3), &stats)
            .await
            .unwrap();
        assert_eq!(stats.get(FailureKind::TeardownRetry), 0);
    }

    #[tokio::test]
    async fn test_busy_twice_then_success() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contacts.sqlite3");
        std::fs::write(&path, b"db").unwrap();

        let remover = FlakyRemover {
            busy_failures: 2,
            calls: RefCell::new(Vec::new()),
        };
        let stats = SweepStats::new();
        remove_store_files(&path, &remover, fast_policy(3), &stats)
            .await
            .unwrap();

        assert!(!path.exists());
        assert_eq!(stats.get(FailureKind::TeardownRetry), 2);
        // three tries on the main file, one each on the sidecars
        assert_eq!(remover.calls.borrow().len(), 5);
    }

    #[tokio::test]
    async fn test_busy_exhausts_attempts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contacts.sqlite3");
        std::fs::write(&path, b"db").unwrap();

        let remover = FlakyRemover {
            busy_failures: usize::MAX,
            calls: RefCell::new(Vec::new()),
        };
        let stats = SweepStats::new();
        let err = remove_store_files(&path, &remover, fast_policy(3), &stats)
            .await
            .unwrap_err();

        match err {
            StoreError::TeardownContention { attempts, .. } => assert_eq!(attempts, 3),
            other => panic!("expected TeardownContention, got {other:?}"),
        }
        assert!(path.exists());
        assert_eq!(remover.calls.borrow().len(), 3);
    }

    #[tokio::test]
    async fn test_other_io_errors_fail_immediately() {
        struct BrokenRemover;
        impl FileRemover for BrokenRemover {
            fn remove(&self, _path: &Path) -> io::Result<()> {
                Err(io::Error::new(ErrorKind::Other, "I/O failure"))
            }
        }

        let stats = SweepStats::new();
        let err = remove_store_files(
            Path::new("contacts.sqlite3"),
            &BrokenRemover,
            fast_policy(3),
            &stats,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, StoreError::StorageUnavailable { .. }));
        assert_eq!(stats.get(FailureKind::TeardownRetry), 0);
    }
}
