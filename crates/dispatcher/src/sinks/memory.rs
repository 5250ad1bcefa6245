//! MemoryWriter - captures lines in memory
//!
//! Clones share the same buffer, so a test keeps one clone and hands the
//! other to a [`LogSink`](super::LogSink).

use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use contracts::Severity;

use super::LogWriter;

/// In-memory line capture
#[derive(Debug, Clone, Default)]
pub struct MemoryWriter {
    lines: Arc<Mutex<Vec<(Severity, String)>>>,
}

impl MemoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every captured line with its severity, in write order
    pub fn lines(&self) -> Vec<(Severity, String)> {
        self.guard().clone()
    }

    /// Captured messages without severities
    pub fn messages(&self) -> Vec<String> {
        self.guard().iter().map(|(_, m)| m.clone()).collect()
    }

    /// All messages joined by newlines, as a terminal would show them
    pub fn text(&self) -> String {
        self.messages().join("\n")
    }

    pub fn clear(&self) {
        self.guard().clear();
    }

    fn guard(&self) -> MutexGuard<'_, Vec<(Severity, String)>> {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LogWriter for MemoryWriter {
    fn kind(&self) -> &'static str {
        "memory"
    }

    fn write_line(&mut self, severity: Severity, message: &str) -> io::Result<()> {
        self.guard().push((severity, message.to_string()));
        Ok(())
    }
}
