//! Report printing
//!
//! The [`ReportPrinter`] is the single sink for a process's console output.
//! Progress lines and summaries may come from different threads (the
//! producer and the aggregator in the pipeline strategy), so the writer sits
//! behind a mutex and every line is written and flushed whole.

pub mod json;
pub mod text;

use crate::config::OutputFormat;
use crate::stats::PuzzleReport;
use crate::Result;
use std::io::Write;
use std::sync::Mutex;

/// Line-oriented writer for one process's reports
pub struct ReportPrinter {
    /// 1-based process number shown on every line
    process: usize,
    format: OutputFormat,
    out: Mutex<Box<dyn Write + Send>>,
}

impl ReportPrinter {
    pub fn new(process: usize, format: OutputFormat, out: Box<dyn Write + Send>) -> Self {
        Self {
            process,
            format,
            out: Mutex::new(out),
        }
    }

    /// Printer writing to standard output
    pub fn stdout(process: usize, format: OutputFormat) -> Self {
        Self::new(process, format, Box::new(std::io::stdout()))
    }

    /// Announce that work on `puzzle` has started
    ///
    /// Text output only; JSON output carries summaries alone.
    pub fn progress(&self, puzzle: usize) -> Result<()> {
        match self.format {
            OutputFormat::Text => self.write_line(&text::format_progress(self.process, puzzle)),
            OutputFormat::Json => Ok(()),
        }
    }

    /// Print the summary of a finished puzzle
    pub fn summary(&self, report: &PuzzleReport) -> Result<()> {
        let line = match self.format {
            OutputFormat::Text => text::format_summary(self.process, report),
            OutputFormat::Json => json::format_summary(self.process, report)?,
        };
        self.write_line(&line)
    }

    fn write_line(&self, line: &str) -> Result<()> {
        let mut out = self
            .out
            .lock()
            .map_err(|_| anyhow::anyhow!("output writer lock poisoned"))?;
        writeln!(out, "{}", line)?;
        out.flush()?;
        Ok(())
    }
}

impl std::fmt::Debug for ReportPrinter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportPrinter")
            .field("process", &self.process)
            .field("format", &self.format)
            .finish()
    }
}

/// In-memory writer for capturing printer output in tests
#[cfg(test)]
#[derive(Clone, Default)]
pub(crate) struct CaptureBuffer(std::sync::Arc<Mutex<Vec<u8>>>);

#[cfg(test)]
impl CaptureBuffer {
    pub fn lines(&self) -> Vec<String> {
        let bytes = self.0.lock().unwrap();
        String::from_utf8_lossy(&bytes).lines().map(str::to_owned).collect()
    }

    pub fn printer(&self, process: usize, format: OutputFormat) -> ReportPrinter {
        ReportPrinter::new(process, format, Box::new(self.clone()))
    }
}

#[cfg(test)]
impl Write for CaptureBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_printer() {
        let buffer = CaptureBuffer::default();
        let printer = buffer.printer(2, OutputFormat::Text);
        printer.progress(0).unwrap();
        printer.summary(&PuzzleReport::new(0)).unwrap();

        assert_eq!(
            buffer.lines(),
            ["Process 2: validating puzzle 1", "Process 2: 0 errors found"]
        );
    }

    #[test]
    fn test_json_printer_skips_progress() {
        let buffer = CaptureBuffer::default();
        let printer = buffer.printer(1, OutputFormat::Json);
        printer.progress(0).unwrap();
        printer.summary(&PuzzleReport::new(0)).unwrap();

        let lines = buffer.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with(r#"{"process":1,"puzzle":1"#));
    }
}
