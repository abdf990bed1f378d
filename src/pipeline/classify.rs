//! Per-file action selection.
//!
//! Copy-through is the fallback whenever crop information is missing, so every
//! discoverable input gets some output. Skip only exists for idempotent re-runs.

use std::fmt;
use std::path::PathBuf;

use crate::catalog::CatalogIndex;

/// A discovered input file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileEntry {
    pub path: PathBuf,
    pub file_name: String,
    pub parsed_id: Option<u64>,
}

impl FileEntry {
    /// Build an entry for `path`, parsing the identifier from its file name.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let parsed_id = super::identifier::parse(&file_name);
        Self {
            path,
            file_name,
            parsed_id,
        }
    }
}

/// Why a file is left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AlreadyExists,
}

/// Why a file is copied through instead of cropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyReason {
    NoIdentifier,
    NotInCatalog,
    NoTimestamp,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::AlreadyExists => write!(f, "already exists"),
        }
    }
}

impl fmt::Display for CopyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CopyReason::NoIdentifier => write!(f, "no identifier"),
            CopyReason::NotInCatalog => write!(f, "not in catalog"),
            CopyReason::NoTimestamp => write!(f, "no timestamp"),
        }
    }
}

/// What to do with one input file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    Skip { reason: SkipReason },
    Copy { reason: CopyReason },
    Crop { start_offset_secs: f64 },
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Skip { reason } => write!(f, "skip ({})", reason),
            Action::Copy { reason } => write!(f, "copy ({})", reason),
            Action::Crop { start_offset_secs } => write!(f, "crop from {:.3}s", start_offset_secs),
        }
    }
}

/// Decide the action for `file`. First matching rule wins:
///
/// 1. destination exists and `overwrite` is off: skip
/// 2. no identifier in the file name: copy
/// 3. identifier unknown to the catalog: copy
/// 4. record has no start offset: copy
/// 5. otherwise crop from the record's offset
pub fn classify(
    file: &FileEntry,
    index: &CatalogIndex,
    destination_exists: bool,
    overwrite: bool,
) -> Action {
    if destination_exists && !overwrite {
        return Action::Skip {
            reason: SkipReason::AlreadyExists,
        };
    }

    let Some(id) = file.parsed_id else {
        return Action::Copy {
            reason: CopyReason::NoIdentifier,
        };
    };

    let Some(record) = index.lookup(id) else {
        return Action::Copy {
            reason: CopyReason::NotInCatalog,
        };
    };

    match record.start_offset_secs {
        Some(start_offset_secs) => Action::Crop { start_offset_secs },
        None => Action::Copy {
            reason: CopyReason::NoTimestamp,
        },
    }
}
