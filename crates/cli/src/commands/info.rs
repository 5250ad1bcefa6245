//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{BackendConfig, LoggingBlueprint};
use dispatcher::ConsoleConfig;
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;
use crate::error::CliError;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    backends: Vec<BackendInfo>,
    supported_backend_types: Vec<String>,
}

#[derive(Serialize)]
struct BackendInfo {
    name: String,
    backend_type: String,
    /// `None` for an unbounded queue
    queue_capacity: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    console: Option<ConsoleInfo>,
}

#[derive(Serialize)]
struct ConsoleInfo {
    sink: String,
    print_parameters: bool,
    print_user_details: bool,
    print_user_properties: bool,
    annotate_priority: bool,
}

impl From<ConsoleConfig> for ConsoleInfo {
    fn from(config: ConsoleConfig) -> Self {
        Self {
            sink: config.sink.to_string(),
            print_parameters: config.print_parameters,
            print_user_details: config.print_user_details,
            print_user_properties: config.print_user_properties,
            annotate_priority: config.annotate_priority,
        }
    }
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let info = build_config_info(&blueprint)?;
    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&info);
    }

    Ok(())
}

fn build_backend_info(backend: &BackendConfig) -> Result<BackendInfo> {
    let console = ConsoleConfig::from_backend_config(backend)
        .with_context(|| format!("Invalid parameters for backend '{}'", backend.name))?;

    Ok(BackendInfo {
        name: backend.name.clone(),
        backend_type: format!("{:?}", backend.backend_type),
        queue_capacity: backend.queue_capacity,
        console: Some(console.into()),
    })
}

fn build_config_info(blueprint: &LoggingBlueprint) -> Result<ConfigInfo> {
    let backends = blueprint
        .backends
        .iter()
        .map(build_backend_info)
        .collect::<Result<Vec<_>>>()?;

    Ok(ConfigInfo {
        version: format!("{:?}", blueprint.version),
        backends,
        supported_backend_types: dispatcher::supported_backend_types()
            .iter()
            .map(|t| format!("{t:?}"))
            .collect(),
    })
}

fn print_config_info(info: &ConfigInfo) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                    fanlog Configuration                      ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("⚙️  Dispatcher");
    println!("   └─ Version: {}", info.version);

    println!("\n📤 Backends ({})", info.backends.len());
    for (i, backend) in info.backends.iter().enumerate() {
        let is_last = i == info.backends.len() - 1;
        let prefix = if is_last { "└─" } else { "├─" };
        let child_prefix = if is_last { "   " } else { "│  " };

        let queue = match backend.queue_capacity {
            Some(capacity) => format!("bounded queue {capacity}"),
            None => "unbounded queue".to_string(),
        };
        println!("   {} {} ({}, {})", prefix, backend.name, backend.backend_type, queue);
        if let Some(ref console) = backend.console {
            println!("   {}  ├─ Sink: {}", child_prefix, console.sink);
            println!(
                "   {}  ├─ Parameters: {}  User details: {}  User properties: {}",
                child_prefix,
                on_off(console.print_parameters),
                on_off(console.print_user_details),
                on_off(console.print_user_properties)
            );
            println!(
                "   {}  └─ Priority annotation: {}",
                child_prefix,
                on_off(console.annotate_priority)
            );
        }
    }

    println!(
        "\n🧩 Supported backend types: {}",
        info.supported_backend_types.join(", ")
    );
    println!();
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}
