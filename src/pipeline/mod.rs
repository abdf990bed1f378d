//! The file-matching and per-file transcoding-decision pipeline.
//!
//! - [`identifier`]: leading-number identifiers in file names
//! - [`classify`]: skip / copy / crop decision for one file
//! - [`runner`]: directory discovery, dispatch to the media tool, run summary

pub mod classify;
pub mod identifier;
pub mod runner;

pub use classify::{Action, CopyReason, FileEntry, SkipReason, classify};
pub use runner::{
    CancelToken, FileFailure, FileOutcome, PlannedFile, RunOptions, RunReport, RunSummary,
    discover, plan, run,
};
