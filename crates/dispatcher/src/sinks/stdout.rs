//! StdoutWriter - plain lines on standard output

use std::io::{self, Write};

use contracts::Severity;

use super::LogWriter;

/// Writes each message followed by a newline.
///
/// Generic over the output so tests (or hosts) can redirect it; the default
/// is the process's standard output.
#[derive(Debug)]
pub struct StdoutWriter<W = io::Stdout> {
    out: W,
}

impl StdoutWriter {
    pub fn new() -> Self {
        Self { out: io::stdout() }
    }
}

impl Default for StdoutWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write + Send + 'static> StdoutWriter<W> {
    /// Write to an arbitrary output instead of stdout
    pub fn with_writer(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send + 'static> LogWriter for StdoutWriter<W> {
    fn kind(&self) -> &'static str {
        "stdout"
    }

    fn write_line(&mut self, _severity: Severity, message: &str) -> io::Result<()> {
        writeln!(self.out, "{message}")
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}
