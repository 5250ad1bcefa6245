//! ConsoleBackend - human-readable lines through a [`LogSink`]
//!
//! Output format (one sink message per call):
//!
//! ```text
//! 📈 Purchase
//!   (key: "price", value: 9.99)
//!   (key: "sku", value: A1)
//! 📈 Identify User
//!   userId: user123
//!   name: John Doe
//!   email: nil
//! 📈 Add User Properties (isHighPriority: false)
//!   (key: "plan", value: pro)
//! 📈 Delete User Profile
//! ```
//!
//! Parameters are always printed in sorted key order so output can be diffed.

use std::fmt::Write;

use async_trait::async_trait;
use contracts::{
    Backend, BackendConfig, ContractError, Event, Parameters, Severity, UserIdentity,
    UserProperties,
};
use tracing::debug;

use crate::sinks::{spawn_sink, LogSink, SinkKind};

/// Which parts of each call the console prints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsoleConfig {
    /// Print event parameters under the event line
    pub print_parameters: bool,
    /// Print name/email under the identify line
    pub print_user_details: bool,
    /// Print properties under the set-properties line
    pub print_user_properties: bool,
    /// Append `(isHighPriority: ..)` to the set-properties line
    pub annotate_priority: bool,
    /// Sink strategy
    pub sink: SinkKind,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            print_parameters: true,
            print_user_details: true,
            print_user_properties: true,
            annotate_priority: true,
            sink: SinkKind::Stdout,
        }
    }
}

impl ConsoleConfig {
    /// Everything off except the headline of each call
    pub fn quiet() -> Self {
        Self {
            print_parameters: false,
            print_user_details: false,
            print_user_properties: false,
            annotate_priority: false,
            ..Self::default()
        }
    }

    /// Build from a backend config's params
    ///
    /// `print_parameters` is also the fallback for the two user toggles.
    pub fn from_backend_config(config: &BackendConfig) -> Result<Self, ContractError> {
        let defaults = Self::default();
        let print_parameters = config.bool_param("print_parameters", defaults.print_parameters)?;
        let sink = config.sink_param()?;

        Ok(Self {
            print_parameters,
            print_user_details: config.bool_param("print_user_details", print_parameters)?,
            print_user_properties: config.bool_param("print_user_properties", print_parameters)?,
            annotate_priority: config.bool_param("annotate_priority", defaults.annotate_priority)?,
            sink,
        })
    }
}

/// Console / system-log backend
pub struct ConsoleBackend {
    name: String,
    config: ConsoleConfig,
    sink: LogSink,
}

impl ConsoleBackend {
    /// Create a console backend with its own sink of `config.sink` kind
    pub fn new(name: impl Into<String>, config: ConsoleConfig) -> Self {
        let sink = spawn_sink(config.sink);
        Self::with_sink(name, config, sink)
    }

    /// Create a console backend writing to an existing sink
    ///
    /// `config.sink` is ignored.
    pub fn with_sink(name: impl Into<String>, config: ConsoleConfig, sink: LogSink) -> Self {
        Self {
            name: name.into(),
            config,
            sink,
        }
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    pub fn sink(&self) -> &LogSink {
        &self.sink
    }

    /// Stop the sink after writing everything queued
    pub async fn shutdown(self) {
        self.sink.shutdown().await;
    }
}

#[async_trait]
impl Backend for ConsoleBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn report_event(&mut self, event: &Event) {
        self.sink.log(
            event.severity(),
            format_event(event, self.config.print_parameters),
        );
    }

    async fn report_screen_view(&mut self, event: &Event) {
        self.report_event(event).await;
    }

    async fn identify_user(&mut self, user: &UserIdentity) {
        self.sink.log(
            Severity::Info,
            format_identify(user, self.config.print_user_details),
        );
    }

    async fn set_user_properties(&mut self, properties: &UserProperties) {
        self.sink.log(
            Severity::Info,
            format_user_properties(
                properties,
                self.config.print_user_properties,
                self.config.annotate_priority,
            ),
        );
    }

    async fn delete_user_profile(&mut self) {
        self.sink.log(Severity::Info, format_delete_profile());
    }

    async fn flush(&mut self) {
        self.sink.flush().await;
        debug!(
            backend = %self.name,
            written = self.sink.lines_written(),
            failures = self.sink.write_failures(),
            "Console backend flushed"
        );
    }
}

/// `<glyph> <name>` plus one sorted line per parameter
pub fn format_event(event: &Event, print_parameters: bool) -> String {
    let mut out = format!("{} {}", event.severity().glyph(), event.name());
    if print_parameters {
        if let Some(parameters) = event.parameters() {
            push_parameters(&mut out, parameters);
        }
    }
    out
}

pub fn format_identify(user: &UserIdentity, print_details: bool) -> String {
    let mut out = format!(
        "{} Identify User\n  userId: {}",
        Severity::Analytic.glyph(),
        user.user_id
    );
    if print_details {
        let _ = write!(
            out,
            "\n  name: {}\n  email: {}",
            user.name.as_deref().unwrap_or("nil"),
            user.email.as_deref().unwrap_or("nil")
        );
    }
    out
}

pub fn format_user_properties(
    properties: &UserProperties,
    print_properties: bool,
    annotate_priority: bool,
) -> String {
    let mut out = format!("{} Add User Properties", Severity::Analytic.glyph());
    if annotate_priority {
        let _ = write!(out, " (isHighPriority: {})", properties.high_priority);
    }
    if print_properties {
        push_parameters(&mut out, &properties.properties);
    }
    out
}

pub fn format_delete_profile() -> String {
    format!("{} Delete User Profile", Severity::Analytic.glyph())
}

fn push_parameters(out: &mut String, parameters: &Parameters) {
    // BTreeMap iteration is already sorted by key
    for (key, value) in parameters {
        let _ = write!(out, "\n  (key: \"{key}\", value: {value})");
    }
}
