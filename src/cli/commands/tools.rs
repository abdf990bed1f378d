//! Tool check and config file commands.

use std::path::Path;

use super::print_ffmpeg_install_instructions;
use crate::config::{self, Config};
use crate::error::Error;
use crate::transcode::Ffmpeg;

/// Check that ffmpeg is installed and runnable
pub fn cmd_check_tools(bin: &str) -> anyhow::Result<()> {
    println!("Checking media tools...\n");

    match Ffmpeg::locate(bin) {
        Ok(ffmpeg) => println!("✓ {}: {}", ffmpeg.bin().display(), ffmpeg.version()),
        Err(e) => {
            println!("✗ {}: NOT FOUND ({})", bin, e);
            print_ffmpeg_install_instructions(bin);
        }
    }

    Ok(())
}

/// Show the effective config, optionally writing the defaults to disk
pub fn cmd_config(
    config: &Config,
    explicit: Option<&Path>,
    init: bool,
    force: bool,
) -> anyhow::Result<()> {
    let path = explicit.map(Path::to_path_buf).or_else(config::config_path);

    if init {
        if let Some(existing) = path.as_deref().filter(|p| p.exists() && !force) {
            anyhow::bail!(
                "{:?} already exists; use --force to replace it",
                existing
            );
        }
        let written = config::save(&Config::default(), path.as_deref())
            .map_err(|e| Error::config(e.to_string()))?;
        println!("✓ Wrote default config to {:?}", written);
        return Ok(());
    }

    match &path {
        Some(p) if p.exists() => println!("# {}\n", p.display()),
        Some(p) => println!("# {} (not present, showing defaults)\n", p.display()),
        None => println!("# no config directory available, showing defaults\n"),
    }
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_config_init_writes_defaults_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        cmd_config(&Config::default(), Some(&path), true, false).unwrap();
        assert!(path.exists());

        // second init without --force refuses
        assert!(cmd_config(&Config::default(), Some(&path), true, false).is_err());
        cmd_config(&Config::default(), Some(&path), true, true).unwrap();
    }

    #[test]
    fn test_check_tools_reports_missing_binary() {
        assert!(cmd_check_tools("/nonexistent/ffmpeg-binary").is_ok());
    }
}
