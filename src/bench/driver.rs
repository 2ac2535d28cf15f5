//! The benchmark sweep.
//!
//! For every size (ascending) and every mode, one full store lifecycle:
//! teardown, bootstrap, batched insert, optional index build, timed lookups,
//! close. Fatal errors abort the sweep; recoverable ones skip or flag the
//! iteration and the sweep moves on.

use std::time::{Duration, Instant};

use log::{error, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::bench::sample::{BenchmarkSample, SampleStatus, SweepReport};
use crate::bench::source::{RecordSource, SyntheticSource};
use crate::bench::teardown::{remove_store_files, FileRemover, FsRemover, TeardownPolicy};
use crate::config::{BenchConfig, IndexMode};
use crate::error_handling::{FailureKind, StoreError, SweepStats};
use crate::storage::{IndexPolicy, RecordStore, StoreOptions};
use crate::utils::duration_as_ms;

/// Runs sweeps described by a `BenchConfig`.
pub struct BenchmarkDriver<R: FileRemover = FsRemover, S: RecordSource = SyntheticSource> {
    config: BenchConfig,
    remover: R,
    source: S,
}

impl BenchmarkDriver<FsRemover, SyntheticSource> {
    pub fn new(config: BenchConfig) -> Self {
        BenchmarkDriver {
            config,
            remover: FsRemover,
            source: SyntheticSource,
        }
    }
}

impl<R: FileRemover> BenchmarkDriver<R, SyntheticSource> {
    /// Uses `remover` for teardown instead of the filesystem.
    pub fn with_remover(config: BenchConfig, remover: R) -> Self {
        BenchmarkDriver {
            config,
            remover,
            source: SyntheticSource,
        }
    }
}

/// What the store phase of an iteration measured.
struct Measurements {
    rows: usize,
    insert_elapsed: Duration,
    index_elapsed: Option<Duration>,
    lookup_mean: Duration,
    lookups: usize,
    lookup_misses: usize,
    partial: Option<usize>,
}

impl<R: FileRemover, S: RecordSource> BenchmarkDriver<R, S> {
    /// Loads records from `source` instead of the synthetic generator.
    pub fn with_source<T: RecordSource>(self, source: T) -> BenchmarkDriver<R, T> {
        BenchmarkDriver {
            config: self.config,
            remover: self.remover,
            source,
        }
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    fn teardown_policy(&self) -> TeardownPolicy {
        TeardownPolicy {
            attempts: self.config.teardown_attempts,
            delay: self.config.teardown_delay,
        }
    }

    /// Runs the whole sweep.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error (`StorageUnavailable`, `InvalidState`,
    /// `TeardownContention`). Samples gathered before it are discarded.
    pub async fn run(&self) -> Result<SweepReport, StoreError> {
        self.config.validate()?;

        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let stats = SweepStats::new();
        let mut samples = Vec::new();
        let mut skipped = Vec::new();
        let start = Instant::now();

        for size in self.config.ordered_sizes() {
            for &mode in &self.config.modes {
                match self.run_iteration(size, mode, &mut rng, &stats).await {
                    Ok(sample) => samples.push(sample),
                    Err(e) if e.is_fatal() => {
                        error!("Sweep aborted at size {} ({}): {}", size, mode, e);
                        return Err(e);
                    }
                    Err(e) => {
                        warn!("Skipping size {} ({}): {}", size, mode, e);
                        if let Some(kind) = e.failure_kind() {
                            stats.increment(kind);
                        }
                        skipped.push((size, mode));
                    }
                }
            }
        }

        remove_store_files(&self.config.db_path, &self.remover, self.teardown_policy(), &stats)
            .await?;

        Ok(SweepReport {
            samples,
            skipped,
            stats,
            elapsed: start.elapsed(),
        })
    }

    /// One store lifecycle for `size` records in `mode`.
    pub async fn run_iteration(
        &self,
        size: usize,
        mode: IndexMode,
        rng: &mut StdRng,
        stats: &SweepStats,
    ) -> Result<BenchmarkSample, StoreError> {
        remove_store_files(&self.config.db_path, &self.remover, self.teardown_policy(), stats)
            .await?;

        let index_policy = match mode {
            IndexMode::WithIndex => self.config.index_policy,
            IndexMode::NoIndex => IndexPolicy::Deferred,
        };
        let start = Instant::now();
        let mut store = RecordStore::open(
            &self.config.db_path,
            StoreOptions {
                batch_size: self.config.batch_size,
                index_policy,
            },
        )
        .await?;

        let measured = self.measure(&mut store, size, mode, rng).await;
        // Close even when measuring failed, so the next teardown can succeed.
        let closed = store.close().await;
        let total_elapsed = start.elapsed();
        tokio::time::sleep(self.config.release_delay).await;

        let measured = settle(measured, closed)?;

        if measured.lookup_misses > 0 {
            warn!(
                "{} of {} lookups missed at size {} ({})",
                measured.lookup_misses, measured.lookups, size, mode
            );
            stats.add(FailureKind::LookupMiss, measured.lookup_misses);
        }

        let status = if let Some(committed) = measured.partial {
            stats.increment(FailureKind::DuplicateKey);
            SampleStatus::PartialInsert { committed }
        } else {
            match self.config.time_limit_for(size) {
                Some(limit) if total_elapsed > limit => {
                    warn!(
                        "Size {} ({}) took {:.2}ms, over the {}ms limit",
                        size,
                        mode,
                        duration_as_ms(total_elapsed),
                        limit.as_millis()
                    );
                    stats.increment(FailureKind::CeilingExceeded);
                    SampleStatus::CeilingExceeded { limit }
                }
                _ => SampleStatus::Ok,
            }
        };

        info!(
            "size={} mode={} insert={:.2}ms lookup={:.4}ms total={:.2}ms",
            size,
            mode,
            duration_as_ms(measured.insert_elapsed),
            duration_as_ms(measured.lookup_mean),
            duration_as_ms(total_elapsed)
        );

        Ok(BenchmarkSample {
            size,
            mode,
            rows: measured.rows,
            insert_elapsed: measured.insert_elapsed,
            index_elapsed: measured.index_elapsed,
            lookup_mean: measured.lookup_mean,
            lookups: measured.lookups,
            lookup_misses: measured.lookup_misses,
            total_elapsed,
            status,
        })
    }

    async fn measure(
        &self,
        store: &mut RecordStore,
        size: usize,
        mode: IndexMode,
        rng: &mut StdRng,
    ) -> Result<Measurements, StoreError> {
        let insert_start = Instant::now();
        let (rows, insert_elapsed, partial) =
            match store.batch_insert(self.source.records(size)).await {
                Ok(report) => (report.rows, report.elapsed, None),
                Err(StoreError::DuplicateKey {
                    committed, batch, ..
                }) => {
                    warn!(
                        "Batch {} rejected at size {}; continuing with {} committed rows",
                        batch, size, committed
                    );
                    (committed, insert_start.elapsed(), Some(committed))
                }
                Err(e) => return Err(e),
            };

        let index_elapsed = if mode == IndexMode::WithIndex {
            let index_start = Instant::now();
            store.create_index().await?;
            Some(index_start.elapsed())
        } else {
            None
        };

        let lookups = if rows == 0 { 0 } else { self.config.lookups };
        let mut lookup_total = Duration::ZERO;
        let mut lookup_misses = 0;
        for _ in 0..lookups {
            let expected = self.source.record(rng.random_range(1..=rows));
            let lookup = store.lookup(&expected.email).await?;
            lookup_total += lookup.elapsed;
            if lookup.name.as_deref() != Some(expected.name.as_str()) {
                lookup_misses += 1;
            }
        }
        let lookup_mean = mean(lookup_total, lookups);

        Ok(Measurements {
            rows,
            insert_elapsed,
            index_elapsed,
            lookup_mean,
            lookups,
            lookup_misses,
            partial,
        })
    }
}

/// Combines the measuring outcome with the close outcome.
///
/// A failed close wins: it leaves the file in an unknown state, which no
/// recoverable measuring error can outrank.
fn settle(
    measured: Result<Measurements, StoreError>,
    closed: Result<(), StoreError>,
) -> Result<Measurements, StoreError> {
    match (measured, closed) {
        (measured, Ok(())) => measured,
        (Ok(_), Err(close_err)) => Err(close_err),
        (Err(measure_err), Err(close_err)) => {
            warn!("Iteration failed before close also failed: {}", measure_err);
            Err(close_err)
        }
    }
}

fn mean(total: Duration, count: usize) -> Duration {
    if count == 0 {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(total.as_secs_f64() / count as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Record;

    fn small_config(dir: &std::path::Path) -> BenchConfig {
        BenchConfig {
            db_path: dir.join("contacts.sqlite3"),
            sizes: vec![50, 5],
            lookups: 10,
            batch_size: 16,
            teardown_delay: Duration::from_millis(1),
            release_delay: Duration::from_millis(1),
            seed: Some(7),
            ..BenchConfig::default()
        }
    }

    /// Synthetic records, except that loads of exactly `size` records give
    /// record `at` the email of record 1.
    struct DuplicateAt {
        size: usize,
        at: usize,
    }

    impl RecordSource for DuplicateAt {
        fn records(&self, count: usize) -> Box<dyn Iterator<Item = Record> + '_> {
            let duplicate = count == self.size;
            Box::new((1..=count).map(move |i| {
                if duplicate && i == self.at {
                    Record::new(format!("name-{}", i), "email-1@domain.tld")
                } else {
                    Record::synthetic(i)
                }
            }))
        }

        fn record(&self, key: usize) -> Record {
            Record::synthetic(key)
        }
    }

    /// Synthetic records with an empty name at position 2 of every load.
    struct EmptyName;

    impl RecordSource for EmptyName {
        fn records(&self, count: usize) -> Box<dyn Iterator<Item = Record> + '_> {
            Box::new((1..=count).map(|i| {
                if i == 2 {
                    Record::new("", "email-2@domain.tld")
                } else {
                    Record::synthetic(i)
                }
            }))
        }

        fn record(&self, key: usize) -> Record {
            Record::synthetic(key)
        }
    }

    fn measured_ok() -> Result<Measurements, StoreError> {
        Ok(Measurements {
            rows: 1,
            insert_elapsed: Duration::ZERO,
            index_elapsed: None,
            lookup_mean: Duration::ZERO,
            lookups: 0,
            lookup_misses: 0,
            partial: None,
        })
    }

    fn close_failure() -> StoreError {
        StoreError::unavailable(
            "failed to close connection",
            std::io::Error::new(std::io::ErrorKind::Other, "disk gone"),
        )
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(Duration::from_millis(10), 0), Duration::ZERO);
        assert_eq!(mean(Duration::from_millis(10), 4), Duration::from_micros(2500));
    }

    #[test]
    fn test_settle_prefers_close_failure() {
        let index_failed = Err(StoreError::IndexCreationFailed {
            index: "index_contacts_email".into(),
            message: "UNIQUE constraint failed".into(),
        });
        let err = settle(index_failed, Err(close_failure())).err().unwrap();
        assert!(matches!(err, StoreError::StorageUnavailable { .. }));
        assert!(err.is_fatal());

        let err = settle(measured_ok(), Err(close_failure()))
            .err()
            .unwrap();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_settle_keeps_measure_error_when_close_succeeds() {
        let index_failed = Err(StoreError::IndexCreationFailed {
            index: "index_contacts_email".into(),
            message: "UNIQUE constraint failed".into(),
        });
        let err = settle(index_failed, Ok(())).err().unwrap();
        assert!(matches!(err, StoreError::IndexCreationFailed { .. }));
        assert!(settle(measured_ok(), Ok(())).is_ok());
    }

    #[tokio::test]
    async fn test_sweep_orders_sizes_and_groups_modes() {
        let dir = tempfile::tempdir().unwrap();
        let driver = BenchmarkDriver::new(small_config(dir.path()));
        let report = driver.run().await.unwrap();

        let order: Vec<(usize, IndexMode)> =
            report.samples.iter().map(|s| (s.size, s.mode)).collect();
        assert_eq!(
            order,
            vec![
                (5, IndexMode::NoIndex),
                (5, IndexMode::WithIndex),
                (50, IndexMode::NoIndex),
                (50, IndexMode::WithIndex),
            ]
        );
        for sample in &report.samples {
            assert_eq!(sample.rows, sample.size);
            assert_eq!(sample.lookups, 10);
            assert_eq!(sample.lookup_misses, 0);
            assert_eq!(
                sample.index_elapsed.is_some(),
                sample.mode == IndexMode::WithIndex
            );
        }
        assert!(report.skipped.is_empty());
        // the final teardown leaves nothing behind
        assert!(!dir.path().join("contacts.sqlite3").exists());
    }

    #[tokio::test]
    async fn test_duplicate_emails_skip_index_build_and_continue() {
        let dir = tempfile::tempdir().unwrap();
        let driver = BenchmarkDriver::new(small_config(dir.path()))
            .with_source(DuplicateAt { size: 5, at: 3 });
        let report = driver.run().await.unwrap();

        assert_eq!(report.skipped, vec![(5, IndexMode::WithIndex)]);
        assert_eq!(report.stats.get(FailureKind::IndexCreationFailed), 1);

        let order: Vec<(usize, IndexMode)> =
            report.samples.iter().map(|s| (s.size, s.mode)).collect();
        assert_eq!(
            order,
            vec![
                (5, IndexMode::NoIndex),
                (50, IndexMode::NoIndex),
                (50, IndexMode::WithIndex),
            ]
        );
        assert!(report.samples[1..].iter().all(|s| s.status.is_ok()));
        assert!(report.samples[1..].iter().all(|s| s.lookup_misses == 0));
    }

    #[tokio::test]
    async fn test_eager_index_duplicate_gives_partial_insert() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = small_config(dir.path());
        config.index_policy = IndexPolicy::Eager;
        // Batches of 16: rows 1..=32 commit, the batch holding row 40 is rejected
        let driver = BenchmarkDriver::new(config).with_source(DuplicateAt { size: 50, at: 40 });
        let report = driver.run().await.unwrap();

        assert!(report.skipped.is_empty());
        assert_eq!(report.samples.len(), 4);
        let partial = &report.samples[3];
        assert_eq!((partial.size, partial.mode), (50, IndexMode::WithIndex));
        assert_eq!(partial.status, SampleStatus::PartialInsert { committed: 32 });
        assert_eq!(partial.rows, 32);
        assert_eq!(partial.lookup_misses, 0);
        assert_eq!(report.stats.get(FailureKind::DuplicateKey), 1);

        // Without the index the duplicate loads fine
        let unindexed = &report.samples[2];
        assert_eq!((unindexed.size, unindexed.mode), (50, IndexMode::NoIndex));
        assert_eq!(unindexed.rows, 50);
        assert!(!report.rows()[3].passed);
    }

    #[tokio::test]
    async fn test_invalid_records_skip_both_modes() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = small_config(dir.path());
        config.sizes = vec![1, 5];
        let driver = BenchmarkDriver::new(config).with_source(EmptyName);
        let report = driver.run().await.unwrap();

        // A single record never reaches the empty name
        assert_eq!(report.samples.len(), 2);
        assert!(report.samples.iter().all(|s| s.size == 1));
        assert_eq!(
            report.skipped,
            vec![(5, IndexMode::NoIndex), (5, IndexMode::WithIndex)]
        );
        assert_eq!(report.stats.get(FailureKind::InvalidRecord), 2);
    }

    #[tokio::test]
    async fn test_ceiling_violation_flags_but_continues() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = small_config(dir.path());
        config.time_limits = [(5, Duration::ZERO)].into_iter().collect();

        let report = BenchmarkDriver::new(config).run().await.unwrap();
        assert_eq!(report.samples.len(), 4);
        let flagged: Vec<_> = report.flagged().map(|s| s.size).collect();
        assert_eq!(flagged, vec![5, 5]);
        assert_eq!(report.stats.get(FailureKind::CeilingExceeded), 2);
        assert!(matches!(
            report.samples[0].status,
            SampleStatus::CeilingExceeded { .. }
        ));
        assert!(report.samples[2].status.is_ok());
    }

    #[tokio::test]
    async fn test_size_zero_skips_lookups() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = small_config(dir.path());
        config.sizes = vec![0];

        let report = BenchmarkDriver::new(config).run().await.unwrap();
        assert_eq!(report.samples.len(), 2);
        for sample in &report.samples {
            assert_eq!(sample.lookups, 0);
            assert_eq!(sample.lookup_mean, Duration::ZERO);
        }
    }

    #[tokio::test]
    async fn test_invalid_config_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = small_config(dir.path());
        config.sizes.clear();
        let err = BenchmarkDriver::new(config).run().await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_unwritable_path_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = small_config(dir.path());
        config.db_path = dir.path().join("missing").join("contacts.sqlite3");
        let err = BenchmarkDriver::new(config).run().await.unwrap_err();
        assert!(matches!(err, StoreError::StorageUnavailable { .. }));
    }
}
