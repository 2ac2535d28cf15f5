//! Markdown table output.

use std::io::Write;

use anyhow::Result;

use super::{ReportRow, ResultReporter};

/// Writes `| Size | Mode | Insert (ms) | Lookup (ms) | Status |` rows.
pub struct TableReporter<W: Write> {
    writer: W,
}

impl<W: Write> TableReporter<W> {
    pub fn new(writer: W) -> Self {
        TableReporter { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ResultReporter for TableReporter<W> {
    fn report(&mut self, rows: &[ReportRow]) -> Result<()> {
        writeln!(self.writer, "| Size | Mode | Insert (ms) | Lookup (ms) | Status |")?;
        writeln!(self.writer, "|------|------|-------------|-------------|--------|")?;
        for row in rows {
            let status = if row.passed {
                "✅".to_string()
            } else {
                format!("❌ {}", row.status)
            };
            writeln!(
                self.writer,
                "| {} | {} | {:.2} | {:.4} | {} |",
                group_thousands(row.size),
                row.mode,
                row.insert_latency_ms,
                row.lookup_latency_ms,
                status
            )?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

/// `1000000` -> `1,000,000`
fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
