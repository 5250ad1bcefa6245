//! `replay` command implementation.
//!
//! A replay script is JSON lines, one call per line:
//!
//! ```text
//! {"op":"event","name":"Purchase","parameters":{"sku":"A1","price":9.99}}
//! {"op":"screen_view","name":"Home","severity":"info"}
//! {"op":"identify","user_id":"user123","name":"John Doe"}
//! {"op":"set_properties","properties":{"plan":"pro"},"high_priority":true}
//! {"op":"delete_profile"}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.

use anyhow::{Context, Result};
use contracts::{Event, Parameters, Severity, UserProperties};
use dispatcher::{create_dispatcher, Dispatcher, MetricsSnapshot, RecordingBackend};
use serde::Deserialize;
use tracing::{info, warn};

use crate::cli::ReplayArgs;
use crate::error::{CliError, LineError};

/// One scripted call
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ReplayCall {
    Event {
        name: String,
        #[serde(default)]
        parameters: Option<Parameters>,
        #[serde(default)]
        severity: Severity,
    },
    ScreenView {
        name: String,
        #[serde(default)]
        parameters: Option<Parameters>,
        #[serde(default)]
        severity: Severity,
    },
    Identify {
        user_id: String,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        email: Option<String>,
    },
    SetProperties {
        properties: Parameters,
        #[serde(default)]
        high_priority: bool,
    },
    DeleteProfile,
}

impl ReplayCall {
    /// Hand the call to the dispatcher
    pub fn dispatch(self, dispatcher: &Dispatcher) {
        match self {
            ReplayCall::Event {
                name,
                parameters,
                severity,
            } => dispatcher.report_event_with(name, parameters, severity),
            ReplayCall::ScreenView {
                name,
                parameters,
                severity,
            } => dispatcher.report_screen_view(Event::from_parts(name, parameters, severity)),
            ReplayCall::Identify {
                user_id,
                name,
                email,
            } => dispatcher.identify_user(user_id, name, email),
            ReplayCall::SetProperties {
                properties,
                high_priority,
            } => dispatcher.set_user_properties(UserProperties {
                properties,
                high_priority,
            }),
            ReplayCall::DeleteProfile => dispatcher.delete_user_profile(),
        }
    }
}

/// Parse a whole script, collecting every malformed line
pub fn parse_script(content: &str) -> Result<Vec<ReplayCall>, CliError> {
    let mut calls = Vec::new();
    let mut errors = Vec::new();

    for (idx, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match serde_json::from_str::<ReplayCall>(line) {
            Ok(call) => calls.push(call),
            Err(e) => errors.push(LineError {
                line: idx + 1,
                message: e.to_string(),
            }),
        }
    }

    if errors.is_empty() {
        Ok(calls)
    } else {
        Err(CliError::InvalidScript { errors })
    }
}

/// Execute the `replay` command
pub async fn run_replay(args: &ReplayArgs) -> Result<()> {
    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let content = std::fs::read_to_string(&args.script)
        .map_err(CliError::from)
        .with_context(|| format!("Failed to read script {}", args.script.display()))?;
    let calls = parse_script(&content)?;

    info!(
        script = %args.script.display(),
        calls = calls.len(),
        backends = blueprint.backends.len(),
        dry_run = args.dry_run,
        "Replaying script"
    );

    let dispatcher = if args.dry_run {
        Dispatcher::builder()
            .backend(RecordingBackend::new("dry-run"))
            .build()?
    } else {
        create_dispatcher(&blueprint).context("Failed to create dispatcher")?
    };

    if dispatcher.is_empty() {
        warn!("No backends configured - every call is a no-op");
    }

    let total = calls.len();
    for call in calls {
        call.dispatch(&dispatcher);
    }

    let report = dispatcher.shutdown().await;
    print_report(total, &report);

    Ok(())
}

fn print_report(total: usize, report: &[(String, MetricsSnapshot)]) {
    println!("\n📊 Replayed {total} call(s) to {} backend(s)", report.len());
    for (i, (name, snapshot)) in report.iter().enumerate() {
        let prefix = if i == report.len() - 1 { "└─" } else { "├─" };
        println!(
            "   {} {}: delivered={} dropped={} panicked={} latency_ms: {}",
            prefix,
            name,
            snapshot.delivered_count,
            snapshot.dropped_count,
            snapshot.panic_count,
            snapshot.latency_ms
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{params, Value};
    use std::io::Write;
    use std::path::PathBuf;

    #[test]
    fn test_parse_every_op() {
        let script = r#"
# warm-up
{"op":"event","name":"Purchase","parameters":{"sku":"A1","qty":2}}
{"op":"screen_view","name":"Home","severity":"info"}

{"op":"identify","user_id":"user123","email":"j@example.com"}
{"op":"set_properties","properties":{"plan":"pro"},"high_priority":true}
{"op":"delete_profile"}
"#;
        let calls = parse_script(script).unwrap();
        assert_eq!(calls.len(), 5);
        assert_eq!(
            calls[0],
            ReplayCall::Event {
                name: "Purchase".into(),
                parameters: Some(params! { "sku" => "A1", "qty" => 2 }),
                severity: Severity::Analytic,
            }
        );
        assert!(matches!(
            &calls[1],
            ReplayCall::ScreenView { severity: Severity::Info, parameters: None, .. }
        ));
        assert_eq!(
            calls[2],
            ReplayCall::Identify {
                user_id: "user123".into(),
                name: None,
                email: Some("j@example.com".into()),
            }
        );
        match &calls[3] {
            ReplayCall::SetProperties {
                properties,
                high_priority,
            } => {
                assert!(*high_priority);
                assert_eq!(properties["plan"], Value::from("pro"));
            }
            other => panic!("unexpected call {other:?}"),
        }
        assert_eq!(calls[4], ReplayCall::DeleteProfile);
    }

    #[test]
    fn test_parse_reports_line_numbers() {
        let script = "{\"op\":\"event\",\"name\":\"ok\"}\n{\"op\":\"launch\"}\n\n{\"op\":\"event\"}\n";
        match parse_script(script) {
            Err(CliError::InvalidScript { errors }) => {
                let lines: Vec<_> = errors.iter().map(|e| e.line).collect();
                assert_eq!(lines, vec![2, 4]);
                assert!(errors[1].message.contains("name"));
            }
            other => panic!("expected InvalidScript, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_unknown_severity() {
        let err = parse_script(r#"{"op":"event","name":"x","severity":"loud"}"#).unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }

    #[tokio::test]
    async fn test_large_script_is_fully_delivered() {
        let script: String = (0..1500)
            .map(|i| format!("{{\"op\":\"event\",\"name\":\"e{i}\"}}\n"))
            .collect();
        let calls = parse_script(&script).unwrap();

        let backend = RecordingBackend::new("rec");
        let recording = backend.recording();
        let dispatcher = Dispatcher::builder().backend(backend).build().unwrap();
        for call in calls {
            call.dispatch(&dispatcher);
        }
        let report = dispatcher.shutdown().await;

        assert_eq!(report[0].1.delivered_count, 1500);
        assert_eq!(report[0].1.dropped_count, 0);
        assert_eq!(recording.len(), 1500);
    }

    fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_run_replay_dry_run() {
        let config = write_temp(".toml", "");
        let script = write_temp(
            ".jsonl",
            "{\"op\":\"event\",\"name\":\"A\"}\n{\"op\":\"delete_profile\"}\n",
        );
        let args = ReplayArgs {
            config: config.path().to_path_buf(),
            script: script.path().to_path_buf(),
            dry_run: true,
            metrics_port: 0,
        };
        run_replay(&args).await.unwrap();
    }

    #[tokio::test]
    async fn test_run_replay_aborts_on_bad_script() {
        let config = write_temp(".toml", "");
        let script = write_temp(".jsonl", "not json\n");
        let args = ReplayArgs {
            config: config.path().to_path_buf(),
            script: script.path().to_path_buf(),
            dry_run: false,
            metrics_port: 0,
        };
        let err = run_replay(&args).await.unwrap_err();
        assert!(err.to_string().contains("malformed"));
    }

    #[tokio::test]
    async fn test_run_replay_missing_config() {
        let args = ReplayArgs {
            config: PathBuf::from("/nonexistent/fanlog.toml"),
            script: PathBuf::from("calls.jsonl"),
            dry_run: false,
            metrics_port: 0,
        };
        let err = run_replay(&args).await.unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
