//! Event - the unit every backend receives
//!
//! An `Event` is built at the call site, shared read-only with each backend,
//! and dropped once the last backend has handled it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{ContractError, Parameters, Value};

/// How much an event should worry a developer.
///
/// Totally ordered: `Info < Analytic < Warning < Severe`. Nothing in the core
/// filters on this ordering; each backend decides what a severity means to it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informative tracing of what the app is doing; not an issue
    Info,
    /// Product analytics events
    #[default]
    Analytic,
    /// Unexpected issue that does not hurt the user experience
    Warning,
    /// Issue that hurts the user experience (crashes, failing flows)
    Severe,
}

impl Severity {
    /// Every level, lowest first
    pub const ALL: [Severity; 4] = [
        Severity::Info,
        Severity::Analytic,
        Severity::Warning,
        Severity::Severe,
    ];

    /// Glyph printed in front of console lines
    pub fn glyph(self) -> &'static str {
        match self {
            Severity::Info => "👋",
            Severity::Analytic => "📈",
            Severity::Warning => "⚠️",
            Severity::Severe => "🚨",
        }
    }

    /// Lowercase label (`info`, `analytic`, `warning`, `severe`)
    pub fn label(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Analytic => "analytic",
            Severity::Warning => "warning",
            Severity::Severe => "severe",
        }
    }

    /// Level used when writing through the host's structured system log
    pub fn native_level(self) -> NativeLevel {
        match self {
            Severity::Info => NativeLevel::Info,
            Severity::Analytic => NativeLevel::Notice,
            Severity::Warning => NativeLevel::Fault,
            Severity::Severe => NativeLevel::Error,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Severity {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Severity::ALL
            .into_iter()
            .find(|level| level.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ContractError::UnknownSeverity(s.to_string()))
    }
}

/// Native system-log level
///
/// Mirrors the level set of OS structured loggers (`info`, `default`,
/// `fault`, `error`). Only the system-log writer looks at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeLevel {
    Info,
    /// The logger's "default" level
    Notice,
    Fault,
    Error,
}

impl NativeLevel {
    pub fn label(self) -> &'static str {
        match self {
            NativeLevel::Info => "info",
            NativeLevel::Notice => "default",
            NativeLevel::Fault => "fault",
            NativeLevel::Error => "error",
        }
    }
}

impl fmt::Display for NativeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Loggable event
///
/// Immutable once built: the builder methods consume `self`.
///
/// # Examples
/// ```
/// use contracts::{params, Event, Severity};
///
/// let event = Event::new("Screen Viewed")
///     .with_parameters(params! { "screen" => "Home" })
///     .with_severity(Severity::Info);
/// assert_eq!(event.name(), "Screen Viewed");
///
/// // A bare name gets the default severity
/// let simple: Event = "App Launched".into();
/// assert_eq!(simple.severity(), Severity::Analytic);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parameters: Option<Parameters>,
    #[serde(default)]
    severity: Severity,
}

impl Event {
    /// Create an event with no parameters and severity `Analytic`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: None,
            severity: Severity::default(),
        }
    }

    /// Create an event from all three parts
    pub fn from_parts(
        name: impl Into<String>,
        parameters: Option<Parameters>,
        severity: Severity,
    ) -> Self {
        Self {
            name: name.into(),
            parameters,
            severity,
        }
    }

    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = Some(parameters);
        self
    }

    /// Add a single parameter, creating the map if needed
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters
            .get_or_insert_with(Parameters::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> Option<&Parameters> {
        self.parameters.as_ref()
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// True when at least one parameter is attached
    pub fn has_parameters(&self) -> bool {
        self.parameters.as_ref().is_some_and(|p| !p.is_empty())
    }
}

impl From<&str> for Event {
    fn from(name: &str) -> Self {
        Event::new(name)
    }
}

impl From<String> for Event {
    fn from(name: String) -> Self {
        Event::new(name)
    }
}
