//! External media tool invocation.
//!
//! The batch runner talks to the media tool through the [`MediaTool`] trait so
//! tests can substitute a fake. Production code uses [`Ffmpeg`].
//!
//! Every invocation is its own unit of failure: errors come back as
//! [`ToolError`] values carrying the tool's diagnostics and never abort a run.

pub mod ffmpeg;

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

pub use ffmpeg::{EncodeSettings, Ffmpeg};

/// Operations the batch runner needs from a media tool.
///
/// Implementations must never leave a file at `dst` unless the operation
/// fully succeeded.
#[async_trait]
pub trait MediaTool: Send + Sync {
    /// Remux `src` into `dst` without re-encoding, keeping tags and cover art.
    async fn copy_through(&self, src: &Path, dst: &Path) -> Result<(), ToolError>;

    /// Re-encode the audio of `src` from `start_offset_secs` onwards into `dst`,
    /// passing cover art and tags through.
    async fn crop(&self, src: &Path, dst: &Path, start_offset_secs: f64)
    -> Result<(), ToolError>;
}

/// A single failed tool invocation.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// The tool process could not be started or waited on
    #[error("{context}: failed to run {bin}: {source}")]
    Spawn {
        context: String,
        bin: String,
        #[source]
        source: std::io::Error,
    },

    /// The tool exited unsuccessfully
    #[error("{context}: exited with {status}: {diagnostics}")]
    Failed {
        context: String,
        status: String,
        diagnostics: String,
    },

    /// The tool did not finish within the configured limit and was killed
    #[error("{context}: timed out after {timeout:?}")]
    TimedOut { context: String, timeout: Duration },

    /// The staged output could not be created or moved into place
    #[error("{context}: {source}")]
    Staging {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl ToolError {
    /// Human-readable description of the operation that failed.
    pub fn context(&self) -> &str {
        match self {
            ToolError::Spawn { context, .. }
            | ToolError::Failed { context, .. }
            | ToolError::TimedOut { context, .. }
            | ToolError::Staging { context, .. } => context,
        }
    }

    /// Captured diagnostic output of the tool, if it ran to completion.
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            ToolError::Failed { diagnostics, .. } => Some(diagnostics),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_error_carries_diagnostics() {
        let err = ToolError::Failed {
            context: "crop 1 Intro.mp3".to_string(),
            status: "exit status: 1".to_string(),
            diagnostics: "Invalid data found when processing input".to_string(),
        };

        assert_eq!(err.context(), "crop 1 Intro.mp3");
        assert_eq!(
            err.diagnostics(),
            Some("Invalid data found when processing input")
        );
        assert!(err.to_string().contains("Invalid data found"));
    }

    #[test]
    fn test_timeout_display() {
        let err = ToolError::TimedOut {
            context: "copy 2 Outro.mp3".to_string(),
            timeout: Duration::from_secs(30),
        };
        assert!(err.to_string().contains("timed out after 30s"));
        assert_eq!(err.diagnostics(), None);
    }
}
