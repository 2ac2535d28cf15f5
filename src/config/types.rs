//! Configuration types and CLI options.
//!
//! This module defines enums and structs used for command-line argument parsing
//! and configuration.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use structopt::StructOpt;
use strum::VariantNames;
use strum_macros::{Display, EnumIter, EnumString, VariantNames};

use crate::config::constants::{
    BATCH_SIZE, DB_PATH, HANDLE_RELEASE_DELAY, LOOKUPS_PER_ITERATION, MAX_BATCH_SIZE,
    SWEEP_SIZES, TEARDOWN_MAX_ATTEMPTS, TEARDOWN_RETRY_DELAY, TIME_LIMITS_MS,
};
use crate::error_handling::StoreError;
use crate::storage::IndexPolicy;

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString, VariantNames)]
#[strum(serialize_all = "lowercase")]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString, VariantNames)]
#[strum(serialize_all = "lowercase")]
pub enum LogFormat {
    Plain,
    Json,
}

/// Whether lookups in a benchmark iteration run against an indexed `email` column.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum IndexMode {
    NoIndex,
    WithIndex,
}

/// Output format for sweep results.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString, VariantNames)]
#[strum(serialize_all = "lowercase")]
pub enum ReportFormat {
    /// Markdown table
    Table,
    /// One JSON object per line
    Jsonl,
    /// Comma-separated values with a header row
    Csv,
}

fn parse_record_count(src: &str) -> Result<usize, String> {
    match src.trim().parse::<usize>() {
        Ok(0) => Err("record count must be a positive integer".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(format!("invalid record count '{}': {}", src, e)),
    }
}

fn parse_batch_size(src: &str) -> Result<usize, String> {
    let size: usize = src
        .trim()
        .parse()
        .map_err(|e| format!("invalid batch size '{}': {}", src, e))?;
    if size == 0 || size > MAX_BATCH_SIZE {
        return Err(format!("batch size must be between 1 and {}", MAX_BATCH_SIZE));
    }
    Ok(size)
}

/// Command-line options for a single store lifecycle: insert `count` contacts,
/// then look up the last one.
#[derive(Debug, Clone, StructOpt)]
#[structopt(
    name = "contact_bench",
    about = "Inserts synthetic contacts into a SQLite store and times a lookup by email."
)]
pub struct ContactsOpt {
    /// Number of contacts to insert
    #[structopt(parse(try_from_str = parse_record_count))]
    pub count: usize,

    /// Database file path
    #[structopt(long, parse(from_os_str), default_value = DB_PATH)]
    pub db_path: PathBuf,

    /// Create the unique email index before looking up
    #[structopt(long)]
    pub with_index: bool,

    /// Rows committed per transaction
    #[structopt(long, default_value = "1000", parse(try_from_str = parse_batch_size))]
    pub batch_size: usize,

    /// Log level: error|warn|info|debug|trace
    #[structopt(long, default_value = "info", possible_values = LogLevel::VARIANTS)]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[structopt(long, default_value = "plain", possible_values = LogFormat::VARIANTS)]
    pub log_format: LogFormat,
}

/// Command-line options for the benchmark sweep.
#[derive(Debug, Clone, StructOpt)]
#[structopt(
    name = "contact_sweep",
    about = "Benchmarks insert and lookup latency across record counts, with and without an email index."
)]
pub struct SweepOpt {
    /// Database file path (deleted and recreated for every iteration)
    #[structopt(long, parse(from_os_str), default_value = DB_PATH)]
    pub db_path: PathBuf,

    /// Comma-separated record counts (defaults to the canonical sweep)
    #[structopt(long, use_delimiter = true)]
    pub sizes: Option<Vec<usize>>,

    /// Drop sweep sizes above this count
    #[structopt(long)]
    pub max_size: Option<usize>,

    /// Point lookups per iteration
    #[structopt(long, default_value = "100")]
    pub lookups: usize,

    /// Rows committed per transaction
    #[structopt(long, default_value = "1000", parse(try_from_str = parse_batch_size))]
    pub batch_size: usize,

    /// Seed for lookup key selection (random if omitted)
    #[structopt(long)]
    pub seed: Option<u64>,

    /// Disable per-size wall-clock ceilings
    #[structopt(long)]
    pub no_ceilings: bool,

    /// In with-index mode, build the index before loading so every insert is checked
    #[structopt(long)]
    pub eager_index: bool,

    /// Report format: table|jsonl|csv
    #[structopt(long, default_value = "table", possible_values = ReportFormat::VARIANTS)]
    pub format: ReportFormat,

    /// Write the report to this file instead of stdout
    #[structopt(long, parse(from_os_str))]
    pub output: Option<PathBuf>,

    /// Log level: error|warn|info|debug|trace
    #[structopt(long, default_value = "info", possible_values = LogLevel::VARIANTS)]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[structopt(long, default_value = "plain", possible_values = LogFormat::VARIANTS)]
    pub log_format: LogFormat,
}

/// Benchmark sweep configuration.
///
/// Passed explicitly into the driver; nothing here is global.
#[derive(Debug, Clone)]
pub struct BenchConfig {
    /// Store file, torn down before every iteration
    pub db_path: PathBuf,
    /// Record counts to exercise (the driver runs them ascending)
    pub sizes: Vec<usize>,
    /// Modes run for every size, in order
    pub modes: Vec<IndexMode>,
    pub batch_size: usize,
    /// Lookups issued per iteration
    pub lookups: usize,
    /// Total teardown attempts (first try included)
    pub teardown_attempts: usize,
    pub teardown_delay: Duration,
    /// Pause after closing a store
    pub release_delay: Duration,
    /// Wall-clock ceiling per size; sizes without an entry are unbounded
    pub time_limits: BTreeMap<usize, Duration>,
    /// Seed for lookup keys; `None` draws from the thread RNG
    pub seed: Option<u64>,
    /// When `with-index` iterations build the index; `no-index` never has one
    pub index_policy: IndexPolicy,
}

impl Default for BenchConfig {
    fn default() -> Self {
        BenchConfig {
            db_path: PathBuf::from(DB_PATH),
            sizes: SWEEP_SIZES.to_vec(),
            modes: vec![IndexMode::NoIndex, IndexMode::WithIndex],
            batch_size: BATCH_SIZE,
            lookups: LOOKUPS_PER_ITERATION,
            teardown_attempts: TEARDOWN_MAX_ATTEMPTS,
            teardown_delay: TEARDOWN_RETRY_DELAY,
            release_delay: HANDLE_RELEASE_DELAY,
            time_limits: default_time_limits(),
            seed: None,
            index_policy: IndexPolicy::Deferred,
        }
    }
}

impl BenchConfig {
    /// Checks settings that would otherwise fail deep inside a sweep.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.sizes.is_empty() {
            return Err(StoreError::InvalidState("sweep has no sizes".into()));
        }
        if self.modes.is_empty() {
            return Err(StoreError::InvalidState("sweep has no modes".into()));
        }
        if self.batch_size == 0 || self.batch_size > MAX_BATCH_SIZE {
            return Err(StoreError::InvalidState(format!(
                "batch size {} outside 1..={}",
                self.batch_size, MAX_BATCH_SIZE
            )));
        }
        if self.teardown_attempts == 0 {
            return Err(StoreError::InvalidState(
                "teardown needs at least one attempt".into(),
            ));
        }
        Ok(())
    }

    /// Ceiling for `size`, if one is configured.
    pub fn time_limit_for(&self, size: usize) -> Option<Duration> {
        self.time_limits.get(&size).copied()
    }

    /// Sizes in the order the driver runs them: ascending, without repeats.
    pub fn ordered_sizes(&self) -> Vec<usize> {
        let mut sizes = self.sizes.clone();
        sizes.sort_unstable();
        sizes.dedup();
        sizes
    }
}

impl From<SweepOpt> for BenchConfig {
    fn from(opt: SweepOpt) -> Self {
        let mut sizes = opt.sizes.unwrap_or_else(|| SWEEP_SIZES.to_vec());
        if let Some(max) = opt.max_size {
            sizes.retain(|&size| size <= max);
        }
        let time_limits = if opt.no_ceilings {
            BTreeMap::new()
        } else {
            default_time_limits()
        };

        BenchConfig {
            db_path: opt.db_path,
            sizes,
            batch_size: opt.batch_size,
            lookups: opt.lookups,
            time_limits,
            seed: opt.seed,
            index_policy: if opt.eager_index {
                IndexPolicy::Eager
            } else {
                IndexPolicy::Deferred
            },
            ..BenchConfig::default()
        }
    }
}

/// The canonical size → ceiling table.
pub fn default_time_limits() -> BTreeMap<usize, Duration> {
    TIME_LIMITS_MS
        .iter()
        .map(|&(size, ms)| (size, Duration::from_millis(ms)))
        .collect()
}
