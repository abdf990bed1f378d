//! Command-line interface for song-cropper.
//!
//! This module provides CLI commands for cropping a downloaded playlist,
//! previewing what a run would do, and checking the ffmpeg installation.

mod commands;

pub use commands::{Cli, Commands, run_command};
