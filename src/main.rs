//! Song Cropper - trims downloaded playlist songs to their catalog start times.
//!
//! Each file in the input directory is matched to a catalog record by the
//! number at the start of its name. Matched files with a known start offset
//! are cropped with ffmpeg; everything else is copied through unchanged, so
//! every input gets an output. Tags and cover art are preserved either way.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod pipeline;
#[cfg(test)]
pub mod test_utils;
pub mod transcode;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // Initialize logging (stderr, so status lines on stdout stay clean)
    let directive = if args.verbose {
        "song_cropper=debug"
    } else {
        "song_cropper=info"
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(directive.parse()?))
        .init();

    cli::run_command(&args)
}
