// Shared test helpers for on-disk stores and fault injection.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use tempfile::TempDir;

use contact_bench::bench::FileRemover;
use contact_bench::{RecordStore, StoreOptions};

/// Store file path inside `dir`.
#[allow(dead_code)] // Used by other test files
pub fn store_path(dir: &TempDir) -> PathBuf {
    dir.path().join("contacts.sqlite3")
}

/// Opens a fresh store in its own temp directory.
/// Keep the returned `TempDir` alive for as long as the store is used.
#[allow(dead_code)] // Used by other test files
pub async fn open_file_store(options: StoreOptions) -> (TempDir, RecordStore) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let store = RecordStore::open(store_path(&dir), options)
        .await
        .expect("Failed to open store");
    (dir, store)
}

/// Remover that reports the file busy for the first `busy_for` calls, then
/// removes for real.
#[allow(dead_code)] // Used by other test files
pub struct BusyThenOk {
    busy_for: usize,
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl BusyThenOk {
    pub fn new(busy_for: usize) -> Self {
        BusyThenOk {
            busy_for,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl FileRemover for BusyThenOk {
    fn remove(&self, path: &Path) -> io::Result<()> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.busy_for {
            return Err(busy_error());
        }
        std::fs::remove_file(path)
    }
}

/// A "file in use" OS error: sharing violation on Windows, `EBUSY` elsewhere.
#[allow(dead_code)]
pub fn busy_error() -> io::Error {
    if cfg!(windows) {
        io::Error::from_raw_os_error(32)
    } else {
        io::Error::from_raw_os_error(16)
    }
}
