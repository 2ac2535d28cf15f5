//! JSON Lines output.

use std::io::Write;

use anyhow::{Context, Result};

use super::{ReportRow, ResultReporter};

/// One JSON object per row, newline-delimited.
pub struct JsonLinesReporter<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesReporter<W> {
    pub fn new(writer: W) -> Self {
        JsonLinesReporter { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ResultReporter for JsonLinesReporter<W> {
    fn report(&mut self, rows: &[ReportRow]) -> Result<()> {
        for row in rows {
            serde_json::to_writer(&mut self.writer, row).context("Failed to serialize row")?;
            writeln!(self.writer)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
