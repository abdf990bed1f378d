//! Configuration system using TOML files.
//!
//! Config is stored in the OS-standard config directory:
//! - Windows: %APPDATA%\song-cropper\config.toml
//! - macOS: ~/Library/Application Support/song-cropper/config.toml
//! - Linux: ~/.config/song-cropper/config.toml
//!
//! A different file can be given with `--config`. Command-line flags always
//! win over values loaded from the file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::transcode::EncodeSettings;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// External media tool settings
    pub tool: ToolConfig,

    /// Batch run defaults
    pub run: RunConfig,
}

/// Media tool settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// ffmpeg binary name or path
    pub bin: String,

    /// Per-invocation limit in seconds (0 = wait forever)
    pub timeout_secs: u64,

    /// Audio encoder for crops (unset = ffmpeg default for the container)
    pub audio_codec: Option<String>,

    /// Audio bitrate for crops, e.g. "320k"
    pub audio_bitrate: Option<String>,

    /// Audio quality for crops, e.g. "0" (ignored when a bitrate is set)
    pub audio_quality: Option<String>,

    /// ID3v2 version for MP3/AIFF output
    pub id3v2_version: u8,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            bin: "ffmpeg".to_string(),
            timeout_secs: 0,
            audio_codec: None,
            audio_bitrate: None,
            audio_quality: None,
            id3v2_version: 3,
        }
    }
}

impl ToolConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    pub fn encode_settings(&self) -> EncodeSettings {
        EncodeSettings {
            audio_codec: self.audio_codec.clone(),
            audio_bitrate: self.audio_bitrate.clone(),
            audio_quality: self.audio_quality.clone(),
            id3v2_version: self.id3v2_version,
        }
    }
}

/// Batch run defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Directory holding the downloaded songs
    pub input_dir: PathBuf,

    /// Directory receiving processed songs
    pub output_dir: PathBuf,

    /// Replace existing outputs
    pub overwrite: bool,

    /// Concurrent ffmpeg invocations
    pub jobs: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("output/songs"),
            output_dir: PathBuf::from("output/cropped"),
            overwrite: false,
            jobs: 1,
        }
    }
}

// ============================================================================
// Config File Operations
// ============================================================================

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("song-cropper"))
}

/// Get the full path to the config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load configuration from `explicit` or the default location.
///
/// Returns default config if the file doesn't exist or can't be parsed.
/// Logs warnings but doesn't fail - we always return a usable config.
pub fn load(explicit: Option<&Path>) -> Config {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match config_path() {
            Some(path) => path,
            None => {
                tracing::warn!("Could not determine config directory, using defaults");
                return Config::default();
            }
        },
    };

    if !path.exists() {
        if explicit.is_some() {
            tracing::warn!("Config file {:?} not found, using defaults", path);
        } else {
            tracing::debug!("No config file found at {:?}, using defaults", path);
        }
        return Config::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => {
                tracing::info!("Loaded config from {:?}", path);
                config
            }
            Err(e) => {
                tracing::error!("Failed to parse config file {:?}: {}", path, e);
                tracing::warn!("Using default configuration");
                Config::default()
            }
        },
        Err(e) => {
            tracing::error!("Failed to read config file {:?}: {}", path, e);
            Config::default()
        }
    }
}

/// Save configuration to `path`, or the default location when `None`.
///
/// Creates the config directory if it doesn't exist. Returns the path written.
pub fn save(config: &Config, path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => config_path().ok_or(ConfigError::NoConfigDir)?,
    };

    // Ensure directory exists
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| ConfigError::CreateDir(dir.to_path_buf(), e))?;
    }

    // Serialize to pretty TOML
    let contents = toml::to_string_pretty(config).map_err(ConfigError::Serialize)?;

    // Write atomically (write to temp, then rename)
    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, &contents).map_err(|e| ConfigError::Write(temp_path.clone(), e))?;
    std::fs::rename(&temp_path, &path)
        .map_err(|e| ConfigError::Rename(temp_path, path.clone(), e))?;

    tracing::info!("Saved config to {:?}", path);
    Ok(path)
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to create config directory {0}: {1}")]
    CreateDir(PathBuf, std::io::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),

    #[error("Failed to write config to {0}: {1}")]
    Write(PathBuf, std::io::Error),

    #[error("Failed to rename temp file {0} to {1}: {2}")]
    Rename(PathBuf, PathBuf, std::io::Error),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[tool]"));
        assert!(toml.contains("[run]"));
        assert!(toml.contains("bin = \"ffmpeg\""));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let toml = r#"
[tool]
audio_bitrate = "320k"
timeout_secs = 120
"#;
        let config: Config = toml::from_str(toml).unwrap();

        // Specified fields are set
        assert_eq!(config.tool.audio_bitrate.as_deref(), Some("320k"));
        assert_eq!(config.tool.timeout(), Some(Duration::from_secs(120)));

        // Other fields use defaults
        assert_eq!(config.tool.bin, "ffmpeg");
        assert_eq!(config.tool.id3v2_version, 3);
        assert_eq!(config.run.jobs, 1);
        assert!(!config.run.overwrite);
        assert_eq!(config.run.input_dir, PathBuf::from("output/songs"));
    }

    #[test]
    fn test_zero_timeout_means_none() {
        assert_eq!(ToolConfig::default().timeout(), None);
    }

    #[test]
    fn test_encode_settings_from_config() {
        let tool = ToolConfig {
            audio_codec: Some("libmp3lame".to_string()),
            audio_quality: Some("0".to_string()),
            id3v2_version: 4,
            ..Default::default()
        };

        let encode = tool.encode_settings();

        assert_eq!(encode.audio_codec.as_deref(), Some("libmp3lame"));
        assert_eq!(encode.audio_quality.as_deref(), Some("0"));
        assert_eq!(encode.audio_bitrate, None);
        assert_eq!(encode.id3v2_version, 4);
    }

    #[test]
    fn test_save_and_load_explicit_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.run.jobs = 4;
        config.tool.bin = "/opt/ffmpeg/bin/ffmpeg".to_string();

        let written = save(&config, Some(&path)).unwrap();
        let loaded = load(Some(&path));

        assert_eq!(written, path);
        assert!(!path.with_extension("toml.tmp").exists());
        assert_eq!(loaded.run.jobs, 4);
        assert_eq!(loaded.tool.bin, "/opt/ffmpeg/bin/ffmpeg");
    }

    #[test]
    fn test_load_invalid_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "this is [not toml").unwrap();

        let config = load(Some(&path));
        assert_eq!(config.tool.bin, "ffmpeg");
    }

    #[test]
    fn test_load_missing_explicit_file_falls_back_to_defaults() {
        let config = load(Some(Path::new("/nonexistent/song-cropper.toml")));
        assert_eq!(config.run.jobs, 1);
    }
}
