//! Rendering sweep results.
//!
//! The driver hands over `ReportRow`s in sample order; a `ResultReporter`
//! writes them somewhere. Formats: markdown table, JSON Lines, CSV.

mod csv;
mod jsonl;
mod table;

use std::io::{self, ErrorKind, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::config::{IndexMode, ReportFormat};

pub use self::csv::CsvReporter;
pub use jsonl::JsonLinesReporter;
pub use table::TableReporter;

/// One reported (size, mode) result. Latencies are milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub size: usize,
    pub mode: IndexMode,
    pub insert_latency_ms: f64,
    /// Mean over the iteration's lookups
    pub lookup_latency_ms: f64,
    pub index_latency_ms: Option<f64>,
    pub total_ms: f64,
    pub passed: bool,
    pub status: String,
}

/// Something that renders sweep results.
pub trait ResultReporter {
    fn report(&mut self, rows: &[ReportRow]) -> Result<()>;
}

/// Builds the reporter for `format`, writing to `output` or to stdout.
pub fn reporter_for(format: ReportFormat, output: Option<&Path>) -> Result<Box<dyn ResultReporter>> {
    let writer: Box<dyn Write> = match output {
        Some(path) => Box::new(
            std::fs::File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?,
        ),
        None => Box::new(IgnoreBrokenPipe::new(io::stdout())),
    };

    Ok(match format {
        ReportFormat::Table => Box::new(TableReporter::new(writer)),
        ReportFormat::Jsonl => Box::new(JsonLinesReporter::new(writer)),
        ReportFormat::Csv => Box::new(CsvReporter::new(writer)),
    })
}

/// Writer wrapper that treats a closed downstream pipe as success, so piping
/// into `head` does not turn into an error.
pub(crate) struct IgnoreBrokenPipe<W: Write> {
    inner: W,
}

impl<W: Write> IgnoreBrokenPipe<W> {
    pub(crate) fn new(inner: W) -> Self {
        Self { inner }
    }
}

impl<W: Write> Write for IgnoreBrokenPipe<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf).or_else(|e| {
            if e.kind() == ErrorKind::BrokenPipe {
                Ok(buf.len())
            } else {
                Err(e)
            }
        })
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush().or_else(|e| {
            if e.kind() == ErrorKind::BrokenPipe {
                Ok(())
            } else {
                Err(e)
            }
        })
    }
}

#[cfg(test)]
pub(crate) fn sample_rows() -> Vec<ReportRow> {
    vec![
        ReportRow {
            size: 1000,
            mode: IndexMode::NoIndex,
            insert_latency_ms: 12.5,
            lookup_latency_ms: 0.25,
            index_latency_ms: None,
            total_ms: 20.0,
            passed: true,
            status: "ok".to_string(),
        },
        ReportRow {
            size: 1000,
            mode: IndexMode::WithIndex,
            insert_latency_ms: 13.0,
            lookup_latency_ms: 0.01,
            index_latency_ms: Some(1.5),
            total_ms: 900.0,
            passed: false,
            status: "exceeded 500ms limit".to_string(),
        },
    ]
}
