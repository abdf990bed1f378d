//! The batch crop command.

use std::time::Duration;
use tokio::runtime::Runtime;

use super::{CropArgs, print_ffmpeg_install_instructions, resolve_dirs};
use crate::catalog;
use crate::config::Config;
use crate::error::Error;
use crate::pipeline::{self, Action, CancelToken, FileOutcome, RunOptions, RunReport};
use crate::transcode::Ffmpeg;

/// Crop matched songs and copy the rest into the output directory
pub fn cmd_crop(rt: &Runtime, config: &Config, args: &CropArgs) -> anyhow::Result<()> {
    let bin = args.ffmpeg_bin.as_deref().unwrap_or(&config.tool.bin);
    let timeout = match args.timeout {
        Some(0) => None,
        Some(secs) => Some(Duration::from_secs(secs)),
        None => config.tool.timeout(),
    };

    let ffmpeg = match Ffmpeg::locate(bin) {
        Ok(ffmpeg) => ffmpeg,
        Err(e) => {
            print_ffmpeg_install_instructions(bin);
            return Err(e.into());
        }
    };
    let ffmpeg = ffmpeg
        .with_encode_settings(config.tool.encode_settings())
        .with_timeout(timeout);

    let index = catalog::load(&args.paths.songs_json)?;
    if index.duplicates() > 0 {
        eprintln!(
            "Warning: {} duplicate song id(s) in {:?}; later records were used.",
            index.duplicates(),
            args.paths.songs_json
        );
    }

    let options = run_options(config, args)?;

    println!("Input:  {:?}", options.input_dir);
    println!("Output: {:?}", options.output_dir);
    println!(
        "Catalog: {} songs ({} with timestamps)",
        index.len(),
        index.timestamped()
    );
    if options.overwrite {
        println!("Overwriting existing files");
    }
    println!();

    let report = rt.block_on(async {
        let cancel = CancelToken::new();
        cancel.cancel_on_ctrl_c();
        pipeline::run(&ffmpeg, &options, &index, &cancel, |outcome| {
            print_outcome(outcome, cancel.is_cancelled())
        })
        .await
    })?;

    print_report(&report);

    exit_status(&report)
}

/// Non-zero exit for an interrupted run or any genuine failure.
fn exit_status(report: &RunReport) -> anyhow::Result<()> {
    if report.cancelled() {
        anyhow::bail!(
            "interrupted: {} file(s) stopped, {} not started",
            report.interrupted_failures().count(),
            report.not_started
        );
    }
    let failed = report.genuine_failures().count();
    if failed > 0 {
        anyhow::bail!("{} file(s) failed", failed);
    }
    Ok(())
}

/// Merge flags over config into run options.
fn run_options(config: &Config, args: &CropArgs) -> crate::error::Result<RunOptions> {
    let (input_dir, output_dir) = resolve_dirs(config, &args.paths);
    let jobs = args.jobs.unwrap_or(config.run.jobs);
    if jobs == 0 {
        return Err(Error::config("jobs must be at least 1"));
    }

    Ok(RunOptions {
        input_dir,
        output_dir,
        overwrite: args.overwrite || config.run.overwrite,
        jobs,
    })
}

/// One status line per finished file
fn print_outcome(outcome: &FileOutcome, cancelled: bool) {
    let name = &outcome.file.entry.file_name;
    match (&outcome.result, outcome.file.action) {
        (Err(_), _) if cancelled => println!("✗ Interrupted {}", name),
        (Err(_), _) => println!("✗ Failed  {}", name),
        (Ok(()), Action::Crop { start_offset_secs }) => {
            println!("✓ Cropped {} (from {:.3}s)", name, start_offset_secs)
        }
        (Ok(()), Action::Copy { reason }) => println!("✓ Copied  {} ({})", name, reason),
        (Ok(()), Action::Skip { reason }) => println!("- Skipped {} ({})", name, reason),
    }
}

fn print_report(report: &RunReport) {
    let summary = &report.summary;
    println!();
    println!(
        "Finished. Cropped {}, copied {}, skipped {} file(s).",
        summary.cropped, summary.copied, summary.skipped
    );

    let failed: Vec<_> = report.genuine_failures().collect();
    if !failed.is_empty() {
        eprintln!("{} file(s) failed:", failed.len());
        for failure in failed {
            eprintln!("  {}: {}", failure.file_name, failure.error.context());
        }
    }
    if report.cancelled() {
        for failure in report.interrupted_failures() {
            eprintln!("  {}: interrupted", failure.file_name);
        }
        eprintln!("Interrupted: {} file(s) were not started.", report.not_started);
    }
}
