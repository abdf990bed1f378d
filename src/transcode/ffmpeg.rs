//! FFmpeg-backed [`MediaTool`].
//!
//! Both operations write into a hidden temporary file next to the destination
//! and only rename it onto the destination after ffmpeg exits with status 0.
//! A failed, timed-out, or killed invocation therefore never leaves a file that
//! a later run would mistake for finished output.
//!
//! Install ffmpeg:
//! - Windows: `winget install Gyan.FFmpeg`
//! - macOS: `brew install ffmpeg`
//! - Linux: `apt install ffmpeg` or equivalent

use async_trait::async_trait;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;
use tempfile::TempPath;

use super::{MediaTool, ToolError};
use crate::error::{Error, Result};

/// Containers whose muxer understands `-id3v2_version`.
const ID3_CONTAINERS: &[&str] = &["mp3", "aif", "aiff"];

/// Muxer forced when the output name has no extension to infer one from.
const FALLBACK_FORMAT: &str = "mp3";

/// Audio encoding knobs for cropped output. Unset fields let ffmpeg choose.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeSettings {
    /// Audio encoder, e.g. `libmp3lame`
    pub audio_codec: Option<String>,
    /// Constant bitrate, e.g. `320k`. Wins over `audio_quality`.
    pub audio_bitrate: Option<String>,
    /// Encoder quality scale value, e.g. `0` for LAME VBR V0
    pub audio_quality: Option<String>,
    /// ID3v2 version written to ID3-tagged containers
    pub id3v2_version: u8,
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self {
            audio_codec: None,
            audio_bitrate: None,
            audio_quality: None,
            id3v2_version: 3,
        }
    }
}

/// A located ffmpeg binary plus invocation settings.
#[derive(Debug, Clone)]
pub struct Ffmpeg {
    bin: PathBuf,
    version: String,
    encode: EncodeSettings,
    timeout: Option<Duration>,
}

impl Ffmpeg {
    /// Locate `bin` by running `bin -version`.
    ///
    /// # Errors
    ///
    /// [`Error::ToolNotFound`] if the binary cannot be executed or reports failure.
    pub fn locate(bin: impl Into<PathBuf>) -> Result<Self> {
        let bin = bin.into();
        let version = probe_version(&bin)?;
        tracing::info!("Using {}", version);

        Ok(Self {
            bin,
            version,
            encode: EncodeSettings::default(),
            timeout: None,
        })
    }

    /// Set encoder settings for crops.
    pub fn with_encode_settings(mut self, encode: EncodeSettings) -> Self {
        self.encode = encode;
        self
    }

    /// Kill invocations that run longer than `timeout`. `None` waits forever.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// First line of `ffmpeg -version`.
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn bin(&self) -> &Path {
        &self.bin
    }

    /// Run ffmpeg writing into a staged file, then move it onto `dst`.
    async fn run_staged(
        &self,
        context: String,
        dst: &Path,
        args: impl FnOnce(&Path) -> Vec<OsString>,
    ) -> std::result::Result<(), ToolError> {
        let staged = stage_output(dst).map_err(|source| ToolError::Staging {
            context: context.clone(),
            source,
        })?;

        let mut cmd = tokio::process::Command::new(&self.bin);
        cmd.args(args(&*staged))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!("Running ffmpeg: {:?}", cmd);

        let spawn_error = |source| ToolError::Spawn {
            context: context.clone(),
            bin: self.bin.display().to_string(),
            source,
        };

        let child = cmd.spawn().map_err(spawn_error)?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| ToolError::TimedOut {
                    context: context.clone(),
                    timeout: limit,
                })?,
            None => child.wait_with_output().await,
        }
        .map_err(spawn_error)?;

        if !output.status.success() {
            return Err(ToolError::Failed {
                context,
                status: output.status.to_string(),
                diagnostics: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        staged.persist(dst).map_err(|e| ToolError::Staging {
            context,
            source: e.error,
        })
    }
}

#[async_trait]
impl MediaTool for Ffmpeg {
    async fn copy_through(&self, src: &Path, dst: &Path) -> std::result::Result<(), ToolError> {
        let context = format!("copy {}", display_name(src));
        self.run_staged(context, dst, |staged| copy_args(src, staged))
            .await
    }

    async fn crop(
        &self,
        src: &Path,
        dst: &Path,
        start_offset_secs: f64,
    ) -> std::result::Result<(), ToolError> {
        let context = format!("crop {} from {:.3}s", display_name(src), start_offset_secs);
        self.run_staged(context, dst, |staged| {
            crop_args(src, staged, start_offset_secs, &self.encode)
        })
        .await
    }
}

/// Run `bin -version` and return its first line.
fn probe_version(bin: &Path) -> Result<String> {
    let output = Command::new(bin)
        .arg("-version")
        .stdin(Stdio::null())
        .output()
        .map_err(|e| Error::tool_not_found(bin.display().to_string(), e.to_string()))?;

    if !output.status.success() {
        return Err(Error::tool_not_found(
            bin.display().to_string(),
            format!("-version exited with {}", output.status),
        ));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(stdout
        .lines()
        .next()
        .unwrap_or("ffmpeg (unknown version)")
        .trim()
        .to_string())
}

/// Reserve a hidden temp file beside `dst` with the same extension, so the
/// muxer is still inferred from the name and discovery never picks it up.
fn stage_output(dst: &Path) -> std::io::Result<TempPath> {
    let dir = match dst.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut suffix = OsString::new();
    if let Some(ext) = dst.extension() {
        suffix.push(".");
        suffix.push(ext);
    }

    let file = tempfile::Builder::new()
        .prefix(".partial-")
        .suffix(&suffix)
        .tempfile_in(dir)?;
    Ok(file.into_temp_path())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or(path.as_os_str())
        .to_string_lossy()
        .into_owned()
}

fn common_args(src: &Path, seek_secs: Option<f64>) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-hide_banner", "-nostdin", "-loglevel", "error", "-y"]
        .into_iter()
        .map(OsString::from)
        .collect();
    if let Some(secs) = seek_secs {
        args.push("-ss".into());
        args.push(format!("{:.3}", secs).into());
    }
    args.push("-i".into());
    args.push(src.as_os_str().to_owned());
    args
}

/// Stream-copy remux keeping every stream and all container metadata.
pub(crate) fn copy_args(src: &Path, out: &Path) -> Vec<OsString> {
    let mut args = common_args(src, None);
    for arg in ["-map", "0", "-c", "copy", "-map_metadata", "0"] {
        args.push(arg.into());
    }
    push_output(&mut args, out);
    args
}

/// Append the output path, naming the muxer when the extension cannot.
fn push_output(args: &mut Vec<OsString>, out: &Path) {
    if out.extension().is_none() {
        args.push("-f".into());
        args.push(FALLBACK_FORMAT.into());
    }
    args.push(out.as_os_str().to_owned());
}

/// Trimmed re-encode of the audio, with any cover image copied as an attachment.
///
/// The seek is an input option: the attached picture packet survives it, and
/// the re-encoded audio is still cut accurately.
pub(crate) fn crop_args(
    src: &Path,
    out: &Path,
    start_offset_secs: f64,
    encode: &EncodeSettings,
) -> Vec<OsString> {
    let mut args = common_args(src, Some(start_offset_secs));
    for arg in ["-map", "0:a", "-map", "0:v?"] {
        args.push(arg.into());
    }

    if let Some(codec) = &encode.audio_codec {
        args.push("-c:a".into());
        args.push(codec.into());
    }
    if let Some(bitrate) = &encode.audio_bitrate {
        args.push("-b:a".into());
        args.push(bitrate.into());
    } else if let Some(quality) = &encode.audio_quality {
        args.push("-q:a".into());
        args.push(quality.into());
    }

    for arg in ["-c:v", "copy", "-disposition:v", "attached_pic", "-map_metadata", "0"] {
        args.push(arg.into());
    }

    let id3_tagged = out
        .extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| ID3_CONTAINERS.contains(&ext.to_ascii_lowercase().as_str()));
    if id3_tagged {
        args.push("-id3v2_version".into());
        args.push(encode.id3v2_version.to_string().into());
    }

    push_output(&mut args, out);
    args
}
