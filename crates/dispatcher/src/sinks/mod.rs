//! Log sinks
//!
//! A [`LogSink`] is a serialized, non-blocking line writer: callers enqueue,
//! one writer thread writes. The actual destination is a [`LogWriter`]:
//! - [`StdoutWriter`]: plain lines on standard output (or any `io::Write`)
//! - [`SystemLogWriter`]: the process's structured log (`tracing`)
//! - [`MemoryWriter`]: in-memory capture for tests and tooling

mod log_sink;
mod memory;
mod stdout;
mod system_log;

use std::io;

use contracts::Severity;

pub use contracts::SinkKind;

pub use self::log_sink::LogSink;
pub use self::memory::MemoryWriter;
pub use self::stdout::StdoutWriter;
pub use self::system_log::SystemLogWriter;

/// Destination of formatted log lines.
///
/// Only ever called from a sink's worker, one line at a time.
pub trait LogWriter: Send + 'static {
    /// Short name of the strategy (for logs/metrics)
    fn kind(&self) -> &'static str;

    /// Write one (possibly multi-line) message
    fn write_line(&mut self, severity: Severity, message: &str) -> io::Result<()>;

    /// Flush buffered output
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Start a sink of the given built-in kind
pub fn spawn_sink(kind: SinkKind) -> LogSink {
    match kind {
        SinkKind::Stdout => LogSink::spawn(StdoutWriter::new()),
        SinkKind::SystemLog => LogSink::spawn(SystemLogWriter::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_spawn_sink_kinds() {
        let stdout = spawn_sink(SinkKind::Stdout);
        assert_eq!(stdout.kind(), "stdout");
        stdout.shutdown().await;

        let system = spawn_sink(SinkKind::SystemLog);
        assert_eq!(system.kind(), "system_log");
        system.shutdown().await;
    }
}
