//! Output destination resolution

use crate::error::{ConfigError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Resolve where a rendered artifact should be written.
///
/// `None` means the caller delivers the artifact in memory (stdout, preview).
/// Relative names land under `default_directory`, which is created on demand;
/// absolute paths are returned unchanged.
pub fn resolve_path(
    user_filename: Option<&Path>,
    default_directory: &Path,
) -> Result<Option<PathBuf>> {
    let Some(filename) = user_filename else {
        return Ok(None);
    };

    if filename.as_os_str().is_empty() {
        return Err(ConfigError::Invalid("output filename must not be empty".to_string()).into());
    }

    if filename.is_absolute() {
        return Ok(Some(filename.to_path_buf()));
    }

    if !default_directory.as_os_str().is_empty() && !default_directory.exists() {
        tracing::debug!(dir = %default_directory.display(), "Creating output directory");
        fs::create_dir_all(default_directory)?;
    }

    Ok(Some(default_directory.join(filename)))
}
