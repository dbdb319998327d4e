//! Command line interface definition

use clap::{Args, Parser, Subcommand};
use dropstone_types::ColorChoice;
use std::path::PathBuf;

/// dropstone - update registry for Dropstone builds
#[derive(Parser)]
#[command(name = "dropstone")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Register, resolve and remove Dropstone builds")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging on stderr
    #[arg(long, global = true)]
    pub debug: bool,

    /// Color output control
    #[arg(long, global = true, value_enum)]
    pub color: Option<ColorChoice>,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory holding the registry snapshots
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Directory holding stored build artifacts
    #[arg(long, global = true, value_name = "DIR")]
    pub downloads_dir: Option<PathBuf>,
}

/// Platform/quality/version triple
#[derive(Args, Debug, Clone)]
pub struct Triple {
    /// Target platform, e.g. cli-win32-x64
    pub platform: String,
    /// Release channel, e.g. stable
    pub quality: String,
    /// Version string
    pub version: String,
}

/// Where the build's bytes come from
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct SourceArgs {
    /// Local file to move into storage
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// External URL the build is hosted at
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Register a build
    #[command(alias = "add")]
    Register {
        #[command(flatten)]
        triple: Triple,

        /// Display name of the build
        name: String,

        #[command(flatten)]
        source: SourceArgs,

        /// Name clients download a local file under (defaults to its file name)
        #[arg(long, requires = "file")]
        original_name: Option<String>,
    },

    /// Register an externally hosted build, guessing the version from its URL
    QuickAdd {
        /// Download URL
        url: String,

        /// Target platform (default from config)
        #[arg(long)]
        platform: Option<String>,

        /// Release channel (default from config)
        #[arg(long)]
        quality: Option<String>,

        /// Version, when it cannot be read from the URL
        #[arg(long)]
        version: Option<String>,

        /// Display name (default "Dropstone <version>")
        #[arg(long)]
        name: Option<String>,
    },

    /// Remove a registered version
    #[command(alias = "rm")]
    Remove {
        #[command(flatten)]
        triple: Triple,
    },

    /// Show the latest version of a channel
    Latest {
        /// Target platform
        platform: String,
        /// Release channel
        quality: String,
    },

    /// Show one registered version
    Show {
        #[command(flatten)]
        triple: Triple,
    },

    /// Show where a version is downloaded from
    Resolve {
        #[command(flatten)]
        triple: Triple,
    },

    /// List every registered version
    #[command(alias = "ls")]
    List,

    /// List the latest version of every channel
    ListLatest,

    /// Show registry table sizes
    Stats,
}
