//! LoggingBlueprint - Config Loader output
//!
//! Describes which backends the composition root registers, in order. Dispatch
//! queues are unbounded unless a backend opts into a capacity.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{ContractError, Parameters, Value};

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete logging configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Backends, in registration order
    #[serde(default)]
    pub backends: Vec<BackendConfig>,
}

/// Largest queue capacity a backend may opt into
pub const MAX_QUEUE_CAPACITY: usize = 1 << 20;

/// Backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Backend name
    pub name: String,

    /// Backend type
    pub backend_type: BackendType,

    /// Bounded queue capacity; unbounded when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_capacity: Option<usize>,

    /// Type-specific parameters
    #[serde(default)]
    pub params: Parameters,
}

impl BackendConfig {
    /// Read the `sink` parameter, falling back to stdout when absent
    pub fn sink_param(&self) -> Result<SinkKind, ContractError> {
        match self.str_param("sink")? {
            Some(name) => name.parse(),
            None => Ok(SinkKind::default()),
        }
    }

    /// Read a boolean parameter, falling back to `default` when absent
    pub fn bool_param(&self, key: &str, default: bool) -> Result<bool, ContractError> {
        match self.params.get(key) {
            None => Ok(default),
            Some(Value::Bool(b)) => Ok(*b),
            Some(other) => Err(ContractError::invalid_parameter(
                key,
                format!("expected bool, got {}", other.type_name()),
            )),
        }
    }

    /// Read a string parameter
    pub fn str_param(&self, key: &str) -> Result<Option<&str>, ContractError> {
        match self.params.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(other) => Err(ContractError::invalid_parameter(
                key,
                format!("expected string, got {}", other.type_name()),
            )),
        }
    }
}

/// Backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendType {
    /// Human-readable console / system-log output
    Console,
}

/// Built-in console sink strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SinkKind {
    /// Standard output
    #[default]
    Stdout,
    /// Structured system log
    SystemLog,
}

impl SinkKind {
    /// Every accepted spelling, canonical name first
    pub const NAMES: &'static [(&'static str, SinkKind)] = &[
        ("stdout", SinkKind::Stdout),
        ("system_log", SinkKind::SystemLog),
        ("syslog", SinkKind::SystemLog),
        ("oslog", SinkKind::SystemLog),
    ];

    pub fn label(self) -> &'static str {
        match self {
            SinkKind::Stdout => "stdout",
            SinkKind::SystemLog => "system_log",
        }
    }
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SinkKind {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_lowercase();
        Self::NAMES
            .iter()
            .find(|(name, _)| *name == lowered)
            .map(|(_, kind)| *kind)
            .ok_or_else(|| {
                ContractError::invalid_parameter(
                    "sink",
                    format!("unknown sink '{s}' (expected stdout or system_log)"),
                )
            })
    }
}
