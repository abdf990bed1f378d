//! Batch runner: one pass over the input directory.
//!
//! Files are discovered in sorted order, classified against the catalog, and
//! dispatched to a [`MediaTool`] through a bounded pool. A tool failure only
//! affects its own file. The [`RunSummary`] is folded on the driving task, so
//! no shared counters are involved even when `jobs > 1`.

use futures::StreamExt;
use futures::future;
use futures::stream;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use walkdir::WalkDir;

use super::classify::{Action, FileEntry, classify};
use super::identifier;
use crate::catalog::CatalogIndex;
use crate::error::{Error, Result, ResultExt};
use crate::transcode::{MediaTool, ToolError};

/// Parameters for one run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Replace existing destination files instead of skipping them
    pub overwrite: bool,
    /// Maximum concurrent tool invocations (clamped to at least 1)
    pub jobs: usize,
}

impl RunOptions {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            overwrite: false,
            jobs: 1,
        }
    }
}

/// Per-action counts for a run. Failed files count only as `failed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub cropped: usize,
    pub copied: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RunSummary {
    fn record(&mut self, outcome: &FileOutcome) {
        if outcome.result.is_err() {
            self.failed += 1;
            return;
        }
        match outcome.file.action {
            Action::Skip { .. } => self.skipped += 1,
            Action::Copy { .. } => self.copied += 1,
            Action::Crop { .. } => self.cropped += 1,
        }
    }

    /// Files that produced output in this run.
    pub fn produced(&self) -> usize {
        self.cropped + self.copied
    }

    /// Files that were looked at, whatever happened to them.
    pub fn total(&self) -> usize {
        self.cropped + self.copied + self.skipped + self.failed
    }
}

/// A classified input file and where its output goes.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedFile {
    pub entry: FileEntry,
    pub destination: PathBuf,
    pub action: Action,
}

/// What happened to one planned file.
#[derive(Debug)]
pub struct FileOutcome {
    pub file: PlannedFile,
    pub result: std::result::Result<(), ToolError>,
}

/// A file whose tool invocation failed.
#[derive(Debug)]
pub struct FileFailure {
    pub file_name: String,
    pub error: ToolError,
    /// The run was cancelled by the time this failure came back. Ctrl-C
    /// reaches the tool's process group too, so these are usually kills.
    pub interrupted: bool,
}

/// Result of a completed (or cancelled) run.
#[derive(Debug, Default)]
pub struct RunReport {
    pub summary: RunSummary,
    pub failures: Vec<FileFailure>,
    /// Files never started because the run was cancelled
    pub not_started: usize,
}

impl RunReport {
    pub fn cancelled(&self) -> bool {
        self.not_started > 0 || self.failures.iter().any(|f| f.interrupted)
    }

    /// Failures not attributable to cancellation.
    pub fn genuine_failures(&self) -> impl Iterator<Item = &FileFailure> {
        self.failures.iter().filter(|f| !f.interrupted)
    }

    pub fn interrupted_failures(&self) -> impl Iterator<Item = &FileFailure> {
        self.failures.iter().filter(|f| f.interrupted)
    }
}

/// Cooperative cancellation: once set, no new invocations start.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Cancel on the first Ctrl-C. Must be called inside a tokio runtime.
    pub fn cancel_on_ctrl_c(&self) {
        let token = self.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted: starting no new files");
                token.cancel();
            }
        });
    }
}

/// List the regular, non-hidden files directly inside `input_dir`, sorted by name.
///
/// Symlinks are followed; dangling ones are logged and skipped.
///
/// # Errors
///
/// [`Error::Directory`] if `input_dir` is missing, not a directory, or unreadable.
pub fn discover(input_dir: &Path) -> Result<Vec<FileEntry>> {
    if !input_dir.is_dir() {
        return Err(Error::directory(
            input_dir,
            "does not exist or is not a directory",
        ));
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(input_dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                return Err(Error::directory(input_dir, e.to_string()));
            }
            Err(e) => {
                tracing::warn!("Skipping unreadable entry in {:?}: {}", input_dir, e);
                continue;
            }
        };

        // Links are resolved, so a symlinked song counts as its target
        if !entry.file_type().is_file() {
            tracing::debug!("Skipping non-regular entry {:?}", entry.path());
            continue;
        }
        if identifier::is_hidden(&entry.file_name().to_string_lossy()) {
            tracing::debug!("Skipping hidden file {:?}", entry.path());
            continue;
        }

        files.push(FileEntry::new(entry.into_path()));
    }

    Ok(files)
}

/// Classify every input file without touching the filesystem.
pub fn plan(
    input_dir: &Path,
    output_dir: &Path,
    index: &CatalogIndex,
    overwrite: bool,
) -> Result<Vec<PlannedFile>> {
    let files = discover(input_dir)?;
    Ok(classify_all(files, output_dir, index, overwrite))
}

fn classify_all(
    files: Vec<FileEntry>,
    output_dir: &Path,
    index: &CatalogIndex,
    overwrite: bool,
) -> Vec<PlannedFile> {
    files
        .into_iter()
        .map(|entry| {
            let destination = match entry.path.file_name() {
                Some(name) => output_dir.join(name),
                None => output_dir.join(&entry.file_name),
            };
            let action = classify(&entry, index, destination.exists(), overwrite);
            PlannedFile {
                entry,
                destination,
                action,
            }
        })
        .collect()
}

/// Process every file in `options.input_dir` into `options.output_dir`.
///
/// `on_outcome` is called once per finished file, in completion order.
///
/// # Errors
///
/// Only run-aborting problems: missing input directory, output directory that
/// cannot be created or equals the input directory. Per-file tool failures are
/// reported in [`RunReport::failures`].
pub async fn run<T>(
    tool: &T,
    options: &RunOptions,
    index: &CatalogIndex,
    cancel: &CancelToken,
    mut on_outcome: impl FnMut(&FileOutcome),
) -> Result<RunReport>
where
    T: MediaTool + ?Sized,
{
    // Validate the input before creating anything.
    let files = discover(&options.input_dir)?;

    std::fs::create_dir_all(&options.output_dir).with_context(format!(
        "creating output directory {}",
        options.output_dir.display()
    ))?;
    ensure_distinct(&options.input_dir, &options.output_dir)?;

    let planned = classify_all(files, &options.output_dir, index, options.overwrite);
    let planned_count = planned.len();
    tracing::info!(
        "Processing {} files from {:?} into {:?} ({} at a time)",
        planned_count,
        options.input_dir,
        options.output_dir,
        options.jobs.max(1)
    );

    let mut report = RunReport::default();
    let outcomes = stream::iter(planned)
        .take_while(|_| future::ready(!cancel.is_cancelled()))
        .map(|file| async move {
            let result = dispatch(tool, &file).await;
            FileOutcome { file, result }
        })
        .buffer_unordered(options.jobs.max(1));
    let mut outcomes = std::pin::pin!(outcomes);

    while let Some(outcome) = outcomes.next().await {
        report.summary.record(&outcome);
        log_outcome(&outcome);
        on_outcome(&outcome);

        if let Err(error) = outcome.result {
            report.failures.push(FileFailure {
                file_name: outcome.file.entry.file_name,
                error,
                interrupted: cancel.is_cancelled(),
            });
        }
    }

    report.not_started = planned_count - report.summary.total();
    if report.cancelled() {
        tracing::warn!("Run cancelled with {} files not started", report.not_started);
    }

    Ok(report)
}

async fn dispatch<T>(tool: &T, file: &PlannedFile) -> std::result::Result<(), ToolError>
where
    T: MediaTool + ?Sized,
{
    match file.action {
        Action::Skip { .. } => Ok(()),
        Action::Copy { .. } => tool.copy_through(&file.entry.path, &file.destination).await,
        Action::Crop { start_offset_secs } => {
            tool.crop(&file.entry.path, &file.destination, start_offset_secs)
                .await
        }
    }
}

fn log_outcome(outcome: &FileOutcome) {
    let name = &outcome.file.entry.file_name;
    match &outcome.result {
        Ok(()) => tracing::debug!("{}: {}", name, outcome.file.action),
        Err(e) => match e.diagnostics() {
            Some(diagnostics) if !diagnostics.is_empty() => {
                tracing::error!("{} failed: {}\n{}", name, e.context(), diagnostics)
            }
            _ => tracing::error!("{} failed: {}", name, e),
        },
    }
}

/// Refuse to write outputs over their own inputs.
fn ensure_distinct(input_dir: &Path, output_dir: &Path) -> Result<()> {
    let input = input_dir
        .canonicalize()
        .with_context(format!("resolving {}", input_dir.display()))?;
    let output = output_dir
        .canonicalize()
        .with_context(format!("resolving {}", output_dir.display()))?;

    if input == output {
        return Err(Error::directory(
            output_dir,
            "output directory must differ from the input directory",
        ));
    }
    Ok(())
}
