//! CLI command definitions and dispatch.
//!
//! Each subcommand is implemented in its own submodule:
//! - `crop`: the batch run (crop, copy through, or skip every file)
//! - `plan`: print the action for every file without touching anything
//! - `tools`: ffmpeg check and config file management

mod crop;
mod plan;
mod tools;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tokio::runtime::Runtime;

use crate::config::{self, Config};

pub use crop::cmd_crop;
pub use plan::cmd_plan;
pub use tools::{cmd_check_tools, cmd_config};

/// Song Cropper CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, global = true, env = "SONG_CROPPER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Catalog and directory locations shared by `crop` and `plan`.
#[derive(Args, Debug, Clone)]
pub struct PathArgs {
    /// Catalog JSON written by the playlist fetcher
    #[arg(long)]
    pub songs_json: PathBuf,

    /// Directory of downloaded songs [config: run.input_dir]
    #[arg(long)]
    pub input_dir: Option<PathBuf>,

    /// Directory for processed songs [config: run.output_dir]
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

/// Options for the `crop` command.
#[derive(Args, Debug, Clone)]
pub struct CropArgs {
    #[command(flatten)]
    pub paths: PathArgs,

    /// ffmpeg binary name or path [config: tool.bin]
    #[arg(long, env = "FFMPEG_BIN")]
    pub ffmpeg_bin: Option<String>,

    /// Replace files that already exist in the output directory
    #[arg(long)]
    pub overwrite: bool,

    /// Number of files processed concurrently [config: run.jobs]
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Per-file ffmpeg time limit in seconds, 0 for none [config: tool.timeout_secs]
    #[arg(long)]
    pub timeout: Option<u64>,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Crop matched songs and copy the rest into the output directory
    Crop(CropArgs),
    /// Show what `crop` would do for every file, without changing anything
    Plan {
        #[command(flatten)]
        paths: PathArgs,
        /// Plan as if --overwrite were given
        #[arg(long)]
        overwrite: bool,
    },
    /// Check that ffmpeg is installed and runnable
    CheckTools {
        /// ffmpeg binary name or path [config: tool.bin]
        #[arg(long, env = "FFMPEG_BIN")]
        ffmpeg_bin: Option<String>,
    },
    /// Show the effective configuration
    Config {
        /// Write the default configuration file
        #[arg(long)]
        init: bool,
        /// Replace an existing file when used with --init
        #[arg(long, requires = "init")]
        force: bool,
    },
}

/// Run the specified CLI command.
pub fn run_command(cli: &Cli) -> anyhow::Result<()> {
    let config = config::load(cli.config.as_deref());

    match &cli.command {
        Commands::Crop(args) => {
            let rt = Runtime::new()?;
            cmd_crop(&rt, &config, args)
        }
        Commands::Plan { paths, overwrite } => cmd_plan(&config, paths, *overwrite),
        Commands::CheckTools { ffmpeg_bin } => {
            cmd_check_tools(ffmpeg_bin.as_deref().unwrap_or(&config.tool.bin))
        }
        Commands::Config { init, force } => {
            cmd_config(&config, cli.config.as_deref(), *init, *force)
        }
    }
}

// ============================================================================
// Shared helper functions
// ============================================================================

/// Print installation instructions for ffmpeg
pub(crate) fn print_ffmpeg_install_instructions(bin: &str) {
    eprintln!("Error: ffmpeg not found (tried \"{}\").", bin);
    eprintln!("Install FFmpeg:");
    eprintln!("  Windows: winget install Gyan.FFmpeg");
    eprintln!("  macOS:   brew install ffmpeg");
    eprintln!("  Linux:   apt install ffmpeg");
    eprintln!("Or point --ffmpeg-bin / FFMPEG_BIN at an existing binary.");
}

/// Resolve input and output directories from flags, falling back to config.
pub(crate) fn resolve_dirs(config: &Config, paths: &PathArgs) -> (PathBuf, PathBuf) {
    (
        paths
            .input_dir
            .clone()
            .unwrap_or_else(|| config.run.input_dir.clone()),
        paths
            .output_dir
            .clone()
            .unwrap_or_else(|| config.run.output_dir.clone()),
    )
}
