//! SystemLogWriter - writes through the process's structured log
//!
//! In a Rust host the structured system log is `tracing`: whatever subscriber
//! the host installed (journald, OSLog bridge, JSON, ...) receives the lines.

use std::io;

use contracts::{NativeLevel, Severity};
use tracing::{error, info, Level};

use super::LogWriter;

/// Target used for every console line emitted through `tracing`
pub const CONSOLE_TARGET: &str = "fanlog::console";

/// Subsystem reported when the host doesn't name one
pub const DEFAULT_SUBSYSTEM: &str = "fanlog";

/// `tracing` level a native level is emitted at
pub fn tracing_level(level: NativeLevel) -> Level {
    match level {
        NativeLevel::Info | NativeLevel::Notice => Level::INFO,
        NativeLevel::Fault | NativeLevel::Error => Level::ERROR,
    }
}

/// Structured system-log writer
#[derive(Debug, Clone)]
pub struct SystemLogWriter {
    subsystem: String,
    category: String,
}

impl SystemLogWriter {
    pub fn new(subsystem: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            subsystem: subsystem.into(),
            category: category.into(),
        }
    }

    pub fn subsystem(&self) -> &str {
        &self.subsystem
    }

    pub fn category(&self) -> &str {
        &self.category
    }
}

impl Default for SystemLogWriter {
    fn default() -> Self {
        Self::new(DEFAULT_SUBSYSTEM, "console")
    }
}

impl LogWriter for SystemLogWriter {
    fn kind(&self) -> &'static str {
        "system_log"
    }

    fn write_line(&mut self, severity: Severity, message: &str) -> io::Result<()> {
        let native = severity.native_level();
        // Macro levels must be constants, hence the match
        if tracing_level(native) == Level::ERROR {
            error!(
                target: CONSOLE_TARGET,
                subsystem = %self.subsystem,
                category = %self.category,
                native_level = %native,
                severity = %severity,
                "{message}"
            );
        } else {
            info!(
                target: CONSOLE_TARGET,
                subsystem = %self.subsystem,
                category = %self.category,
                native_level = %native,
                severity = %severity,
                "{message}"
            );
        }
        Ok(())
    }
}
