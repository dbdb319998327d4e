//! dropstone - update registry for Dropstone builds
//!
//! Administrative front end over the registry: register and remove builds,
//! and answer the same latest/version/download queries the update endpoint
//! serves.

mod cli;
mod display;
mod error;
mod output;

use crate::cli::{Cli, Commands, SourceArgs, Triple};
use crate::display::OutputRenderer;
use crate::error::CliError;
use crate::output::CommandOutput;
use clap::Parser;
use dropstone_config::Config;
use dropstone_errors::UserFacingError;
use dropstone_repository::{infer_version_from_url, LocalRegistry};
use dropstone_types::{ArtifactSource, VersionSummary};
use std::process;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Parse command line arguments first to check for JSON mode
    let cli = Cli::parse();
    let json_mode = cli.global.json;

    init_tracing(json_mode, cli.global.debug);

    if let Err(e) = run(cli).await {
        error!("Application error: {}", e);
        if json_mode {
            let payload = serde_json::json!({
                "type": "Error",
                "data": {
                    "code": e.code(),
                    "message": error_message(&e),
                },
            });
            println!("{payload:#}");
        } else {
            eprintln!("Error: {e}");
        }
        process::exit(1);
    }
}

/// Main application logic
async fn run(cli: Cli) -> Result<(), CliError> {
    info!("Starting dropstone v{}", env!("CARGO_PKG_VERSION"));

    // 1. File config (or defaults)
    let mut config = Config::load_or_default(cli.global.config.as_deref()).await?;

    // 2. Environment variables
    config.merge_env()?;

    // 3. CLI flags (highest precedence)
    apply_cli_config(&mut config, &cli.global);

    let registry = LocalRegistry::open_local(&config).await?;
    let renderer = OutputRenderer::new(cli.global.json, cli.global.color.unwrap_or_default());

    let result = execute_command(cli.command, &registry, &config).await?;
    renderer.render_result(&result)?;

    info!("Command completed successfully");
    Ok(())
}

/// Execute a single command against the registry
async fn execute_command(
    command: Commands,
    registry: &LocalRegistry,
    config: &Config,
) -> Result<CommandOutput, CliError> {
    match command {
        Commands::Register {
            triple,
            name,
            source,
            original_name,
        } => {
            let source = artifact_source(source, original_name)?;
            register(registry, &triple, &name, source).await
        }

        Commands::QuickAdd {
            url,
            platform,
            quality,
            version,
            name,
        } => {
            let version = match version {
                Some(version) => version,
                None => infer_version_from_url(&url).ok_or_else(|| {
                    CliError::InvalidArguments(format!(
                        "no version found in {url}; pass --version"
                    ))
                })?,
            };
            let triple = Triple {
                platform: platform.unwrap_or_else(|| config.registry.default_platform.clone()),
                quality: quality.unwrap_or_else(|| config.registry.default_quality.clone()),
                version,
            };
            let name = name.unwrap_or_else(|| format!("Dropstone {}", triple.version));
            register(registry, &triple, &name, ArtifactSource::external(url)).await
        }

        Commands::Remove { triple } => {
            let report = registry
                .remove(&triple.platform, &triple.quality, &triple.version)
                .await?;
            Ok(CommandOutput::Removed(report))
        }

        Commands::Latest { platform, quality } => {
            let summary = registry.resolve_latest(&platform, &quality).await?;
            Ok(CommandOutput::Version(summary))
        }

        Commands::Show { triple } => {
            let summary = registry
                .resolve_version(&triple.platform, &triple.quality, &triple.version)
                .await?;
            Ok(CommandOutput::Version(summary))
        }

        Commands::Resolve { triple } => {
            let target = registry
                .resolve_download(&triple.platform, &triple.quality, &triple.version)
                .await?;
            Ok(CommandOutput::Download(target))
        }

        Commands::List => Ok(CommandOutput::Listing(registry.list_all().await)),

        Commands::ListLatest => Ok(CommandOutput::Listing(registry.list_latest().await)),

        Commands::Stats => Ok(CommandOutput::Stats(registry.stats().await)),
    }
}

async fn register(
    registry: &LocalRegistry,
    triple: &Triple,
    name: &str,
    source: ArtifactSource,
) -> Result<CommandOutput, CliError> {
    let record = registry
        .register(
            &triple.platform,
            &triple.quality,
            &triple.version,
            name,
            source,
        )
        .await?;
    Ok(CommandOutput::Registered(VersionSummary::from_record(
        &triple.platform,
        &triple.quality,
        &record,
    )))
}

fn artifact_source(
    source: SourceArgs,
    original_name: Option<String>,
) -> Result<ArtifactSource, CliError> {
    match (source.file, source.url) {
        (Some(path), None) => Ok(match original_name {
            Some(original_name) => ArtifactSource::LocalFile {
                path,
                original_name,
                size: None,
            },
            None => ArtifactSource::local_file(path),
        }),
        (None, Some(url)) => Ok(ArtifactSource::external(url)),
        _ => Err(CliError::InvalidArguments(
            "pass exactly one of --file or --url".to_string(),
        )),
    }
}

fn error_message(e: &CliError) -> String {
    match e {
        CliError::Registry(inner) => inner.user_message().into_owned(),
        other => other.to_string(),
    }
}

/// Initialize tracing/logging
fn init_tracing(json_mode: bool, debug_enabled: bool) {
    let default_filter = if debug_enabled {
        "info,dropstone=debug,dropstone_repository=debug,dropstone_index=debug"
    } else {
        "warn"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    if json_mode {
        // stdout carries the command result
        tracing_subscriber::fmt()
            .json()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .init();
    }
}

/// Apply CLI configuration overrides (highest precedence)
fn apply_cli_config(config: &mut Config, global: &cli::GlobalArgs) {
    if let Some(dir) = &global.data_dir {
        config.paths.data_dir = Some(dir.clone());
    }
    if let Some(dir) = &global.downloads_dir {
        config.paths.downloads_dir = Some(dir.clone());
    }
}
