//! Preview command: classify every file without processing it.

use super::{PathArgs, resolve_dirs};
use crate::catalog;
use crate::config::Config;
use crate::pipeline::{self, Action, PlannedFile};

/// Show what `crop` would do for every file
pub fn cmd_plan(config: &Config, paths: &PathArgs, overwrite: bool) -> anyhow::Result<()> {
    let index = catalog::load(&paths.songs_json)?;
    let (input_dir, output_dir) = resolve_dirs(config, paths);
    let overwrite = overwrite || config.run.overwrite;

    let planned = pipeline::plan(&input_dir, &output_dir, &index, overwrite)?;

    if planned.is_empty() {
        println!("No files found in {:?}.", input_dir);
        return Ok(());
    }

    println!("[PLAN - no files will be written]\n");
    for file in &planned {
        println!("{:<28} {}", file.action.to_string(), file.entry.file_name);
    }

    let (crop, copy, skip) = count_actions(&planned);
    println!(
        "\n{} file(s): {} to crop, {} to copy, {} to skip.",
        planned.len(),
        crop,
        copy,
        skip
    );
    Ok(())
}

fn count_actions(planned: &[PlannedFile]) -> (usize, usize, usize) {
    planned
        .iter()
        .fold((0, 0, 0), |(crop, copy, skip), file| match file.action {
            Action::Crop { .. } => (crop + 1, copy, skip),
            Action::Copy { .. } => (crop, copy + 1, skip),
            Action::Skip { .. } => (crop, copy, skip + 1),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{touch, write_catalog};
    use tempfile::tempdir;

    #[test]
    fn test_plan_command_leaves_output_untouched() {
        let root = tempdir().unwrap();
        let input = root.path().join("songs");
        let output = root.path().join("cropped");
        std::fs::create_dir(&input).unwrap();
        touch(&input, "1 Intro.mp3");
        touch(&input, "2 Outro.mp3");
        let songs_json = write_catalog(
            root.path(),
            r#"[{"id": 1, "timestamps": {"main": [12.5]}}]"#,
        );

        let paths = PathArgs {
            songs_json,
            input_dir: Some(input),
            output_dir: Some(output.clone()),
        };

        cmd_plan(&Config::default(), &paths, false).unwrap();
        assert!(!output.exists());
    }

    #[test]
    fn test_plan_command_missing_input_dir() {
        let root = tempdir().unwrap();
        let paths = PathArgs {
            songs_json: write_catalog(root.path(), "[]"),
            input_dir: Some(root.path().join("missing")),
            output_dir: Some(root.path().join("cropped")),
        };

        assert!(cmd_plan(&Config::default(), &paths, false).is_err());
    }

    #[test]
    fn test_count_actions() {
        let root = tempdir().unwrap();
        touch(root.path(), "1 Intro.mp3");
        touch(root.path(), "2 Outro.mp3");
        let index = catalog::parse(r#"[{"id": 1, "timestamps": {"main": [3]}}]"#).unwrap();

        let planned = pipeline::plan(root.path(), &root.path().join("out"), &index, false).unwrap();

        assert_eq!(count_actions(&planned), (1, 1, 0));
    }
}
