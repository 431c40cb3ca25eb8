//! Expanding the downloaded zip archives.

use log::info;
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;
use zip::ZipArchive;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Invalid archive search pattern for '{0}'")]
    Pattern(PathBuf, #[source] glob::PatternError),

    #[error("Failed to list archives in '{0}'")]
    Listing(PathBuf, #[source] glob::GlobError),

    #[error("Failed to open archive '{0}'")]
    Open(PathBuf, #[source] std::io::Error),

    #[error("Failed to extract archive '{0}'")]
    Extract(PathBuf, #[source] zip::result::ZipError),
}

/// Extracts every `*.zip` directly inside `dir` into `dir` itself.
///
/// Archives are processed in file-name order and existing files are
/// overwritten. Returns the archives that were expanded.
pub fn extract_archives(dir: &Path) -> Result<Vec<PathBuf>, ExtractError> {
    let pattern = dir.join("*.zip");
    let pattern_str = pattern.to_string_lossy();
    let mut archives = glob::glob(&pattern_str)
        .map_err(|e| ExtractError::Pattern(dir.to_path_buf(), e))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ExtractError::Listing(dir.to_path_buf(), e))?;
    archives.sort();

    for archive_path in &archives {
        info!("Extracting {:?}", archive_path);
        let file = File::open(archive_path).map_err(|e| ExtractError::Open(archive_path.clone(), e))?;
        let mut archive =
            ZipArchive::new(file).map_err(|e| ExtractError::Extract(archive_path.clone(), e))?;
        archive
            .extract(dir)
            .map_err(|e| ExtractError::Extract(archive_path.clone(), e))?;
    }
    Ok(archives)
}
