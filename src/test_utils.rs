//! Test utilities and fixtures for song-cropper tests.
//!
//! Provides a recording [`FakeTool`] that stands in for ffmpeg, plus small
//! filesystem helpers.
//!
//! # Example
//!
//! ```ignore
//! use song_cropper::test_utils::{FakeTool, touch};
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let dir = tempfile::tempdir().unwrap();
//!     touch(dir.path(), "1 Intro.mp3");
//!     let tool = FakeTool::failing_on(&["1 Intro.mp3"]);
//!     // ... run the pipeline, then inspect tool.calls()
//! }
//! ```

use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Mutex;

use crate::pipeline::CancelToken;
use crate::transcode::{MediaTool, ToolError};

/// One recorded invocation of the fake tool.
#[derive(Debug, Clone, PartialEq)]
pub enum FakeCall {
    Copy { file_name: String },
    Crop { file_name: String, start_offset_secs: f64 },
}

/// In-memory [`MediaTool`] that records calls and writes small marker files.
///
/// Files listed in `failing` get a `ToolError::Failed` with diagnostics
/// `"simulated failure"` and no output. A file set with
/// [`FakeTool::cancelling_on`] cancels the run while it is in flight, the way
/// a Ctrl-C does.
#[derive(Debug, Default)]
pub struct FakeTool {
    calls: Mutex<Vec<FakeCall>>,
    failing: HashSet<String>,
    cancel_on: Option<(String, CancelToken)>,
}

impl FakeTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(file_names: &[&str]) -> Self {
        Self {
            failing: file_names.iter().map(|n| n.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn cancelling_on(mut self, file_name: &str, cancel: &CancelToken) -> Self {
        self.cancel_on = Some((file_name.to_string(), cancel.clone()));
        self
    }

    /// Calls made so far, sorted by file name so concurrent runs compare stably.
    pub fn calls(&self) -> Vec<FakeCall> {
        let mut calls = self.calls.lock().unwrap().clone();
        calls.sort_by(|a, b| call_name(a).cmp(call_name(b)));
        calls
    }

    fn finish(&self, call: FakeCall, dst: &Path, contents: String) -> Result<(), ToolError> {
        let name = call_name(&call).to_string();
        self.calls.lock().unwrap().push(call);

        if let Some((_, cancel)) = self.cancel_on.as_ref().filter(|(n, _)| *n == name) {
            cancel.cancel();
        }

        if self.failing.contains(&name) {
            return Err(ToolError::Failed {
                context: format!("fake {}", name),
                status: "exit status: 1".to_string(),
                diagnostics: "simulated failure".to_string(),
            });
        }

        std::fs::write(dst, contents).map_err(|source| ToolError::Staging {
            context: format!("fake {}", name),
            source,
        })
    }
}

fn call_name(call: &FakeCall) -> &str {
    match call {
        FakeCall::Copy { file_name } | FakeCall::Crop { file_name, .. } => file_name,
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[async_trait]
impl MediaTool for FakeTool {
    async fn copy_through(&self, src: &Path, dst: &Path) -> Result<(), ToolError> {
        let name = file_name(src);
        self.finish(
            FakeCall::Copy {
                file_name: name.clone(),
            },
            dst,
            format!("copy of {}", name),
        )
    }

    async fn crop(&self, src: &Path, dst: &Path, start_offset_secs: f64) -> Result<(), ToolError> {
        let name = file_name(src);
        self.finish(
            FakeCall::Crop {
                file_name: name.clone(),
                start_offset_secs,
            },
            dst,
            format!("{} from {}s", name, start_offset_secs),
        )
    }
}

/// Create a small file named `name` inside `dir`.
pub fn touch(dir: &Path, name: &str) {
    std::fs::write(dir.join(name), b"fake audio").expect("Failed to create test file");
}

/// File name to contents for every entry in `dir`.
pub fn dir_snapshot(dir: &Path) -> BTreeMap<String, Vec<u8>> {
    std::fs::read_dir(dir)
        .expect("Failed to read directory")
        .map(|e| e.expect("Failed to read entry"))
        .map(|e| {
            (
                e.file_name().to_string_lossy().into_owned(),
                std::fs::read(e.path()).expect("Failed to read file"),
            )
        })
        .collect()
}

/// Write a catalog JSON file into `dir` and return its path.
pub fn write_catalog(dir: &Path, json: &str) -> std::path::PathBuf {
    let path = dir.join("songs.json");
    std::fs::write(&path, json).expect("Failed to write catalog");
    path
}
