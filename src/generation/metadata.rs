//! Record of the files a generator run produced, kept in the output
//! directory so the next run can remove files it no longer renders.

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

use tokio::fs;

use super::errors::GenerationError;

pub const METADATA_DIR: &str = ".specweave";
pub const METADATA_FILE: &str = "FILES";

pub fn metadata_path(output_dir: &Path) -> PathBuf {
    output_dir.join(METADATA_DIR).join(METADATA_FILE)
}

/// Files listed by the previous run, relative to `output_dir`. A missing
/// metadata file means no prior run.
pub async fn read_metadata(output_dir: &Path) -> Result<Vec<PathBuf>, GenerationError> {
    let path = metadata_path(output_dir);
    let content = match fs::read_to_string(&path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(GenerationError::MetadataError(format!(
                "failed to read {}: {e}",
                path.display()
            )));
        }
    };
    tracing::debug!(path = %path.display(), "Listing previously generated files");
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .collect())
}

/// Overwrites the metadata with `files`, stored relative to `output_dir`.
pub async fn write_metadata(output_dir: &Path, files: &[PathBuf]) -> Result<(), GenerationError> {
    let path = metadata_path(output_dir);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let mut content = String::new();
    for file in files {
        let relative = file.strip_prefix(output_dir).unwrap_or(file);
        content.push_str(&relative.to_string_lossy().replace('\\', "/"));
        content.push('\n');
    }
    fs::write(&path, content)
        .await
        .map_err(|e| GenerationError::MetadataError(format!("failed to write {}: {e}", path.display())))
}

/// Entries of `previous` missing from `current`, both relative to the
/// output directory.
pub fn stale_files(previous: &[PathBuf], current: &[PathBuf]) -> Vec<PathBuf> {
    let current: BTreeSet<&PathBuf> = current.iter().collect();
    previous
        .iter()
        .filter(|file| !current.contains(file))
        .cloned()
        .collect()
}

/// True for relative paths without `..`, root or drive components.
pub fn stays_inside(path: &Path) -> bool {
    !path.components().any(|component| {
        matches!(
            component,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}

/// Deletes a previously generated file if it still exists as a regular file.
/// Entries pointing outside `output_dir` are skipped.
pub async fn remove_generated_file(output_dir: &Path, file: &Path) -> Result<(), GenerationError> {
    if !stays_inside(file) {
        tracing::warn!(file = %file.display(), "Ignoring metadata entry outside the output directory");
        return Ok(());
    }
    let path = output_dir.join(file);
    match fs::metadata(&path).await {
        Ok(meta) if meta.is_file() => {
            tracing::debug!(file = %file.display(), "Removing obsolete file");
            fs::remove_file(&path).await?;
        }
        _ => {}
    }
    Ok(())
}
