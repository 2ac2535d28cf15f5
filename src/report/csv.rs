//! CSV output, one record per row with a header.

use std::io::Write;

use anyhow::{Context, Result};
use csv::Writer;

use super::{ReportRow, ResultReporter};

pub struct CsvReporter<W: Write> {
    writer: Writer<W>,
}

impl<W: Write> CsvReporter<W> {
    pub fn new(writer: W) -> Self {
        CsvReporter {
            writer: Writer::from_writer(writer),
        }
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Failed to flush CSV writer: {}", e.error()))
    }
}

impl<W: Write> ResultReporter for CsvReporter<W> {
    fn report(&mut self, rows: &[ReportRow]) -> Result<()> {
        for row in rows {
            self.writer
                .serialize(row)
                .context("Failed to write CSV record")?;
        }
        self.writer.flush().context("Failed to flush CSV writer")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::sample_rows;

    #[test]
    fn test_header_and_rows() {
        let mut reporter = CsvReporter::new(Vec::new());
        reporter.report(&sample_rows()).unwrap();
        let out = String::from_utf8(reporter.into_inner().unwrap()).unwrap();
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(
            lines[0],
            "size,mode,insert_latency_ms,lookup_latency_ms,index_latency_ms,total_ms,passed,status"
        );
        assert_eq!(lines[1], "1000,no-index,12.5,0.25,,20.0,true,ok");
        assert_eq!(
            lines[2],
            "1000,with-index,13.0,0.01,1.5,900.0,false,exceeded 500ms limit"
        );
    }
}
