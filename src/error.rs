//! Application-wide error types.
//!
//! Run-aborting failures (missing tool, bad catalog, missing input directory)
//! are [`Error`] values. Per-file media tool failures use
//! [`ToolError`](crate::transcode::ToolError) instead and never escape the
//! batch runner. CLI/main uses `anyhow` for convenient error propagation.
//!
//! # Example
//!
//! ```ignore
//! use song_cropper::error::{Error, Result};
//!
//! fn prepare(input: &Path) -> Result<()> {
//!     let index = catalog::load(json)?;     // InvalidCatalog
//!     let files = pipeline::discover(input)?; // Directory
//!     Ok(())
//! }
//! ```

use std::path::PathBuf;

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level application error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Catalog unreadable, malformed, or containing a record without an id
    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),

    /// Input directory missing or unusable
    #[error("Directory error for {path}: {message}")]
    Directory { path: PathBuf, message: String },

    /// The external media tool could not be located or executed
    #[error("Media tool not found: {bin} ({message})")]
    ToolNotFound { bin: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create an invalid catalog error.
    pub fn invalid_catalog(message: impl Into<String>) -> Self {
        Self::InvalidCatalog(message.into())
    }

    /// Create a directory error.
    pub fn directory(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Directory {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a tool-not-found error.
    pub fn tool_not_found(bin: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolNotFound {
            bin: bin.into(),
            message: message.into(),
        }
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Add context to an error.
    pub fn context(self, ctx: impl Into<String>) -> Self {
        Self::WithContext {
            context: ctx.into(),
            source: Box::new(self),
        }
    }
}

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn with_context(self, ctx: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Io(e).context(ctx))
    }
}
