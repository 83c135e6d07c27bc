//! Atomic publication of the rendered document
//!
//! The textfile directory is shared with a concurrently scraping agent and
//! possibly with an overlapping collector invocation, so the document is
//! written to a pid-suffixed temporary file and renamed over the
//! destination. A reader sees either the previous complete file or the new
//! one, never a partial write.

use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{Result, VpnMetricsError};

/// Write `contents` to `directory/file_name`, replacing any prior document
/// atomically. Returns the destination path.
pub fn publish(directory: &Path, file_name: &str, contents: &str) -> Result<PathBuf> {
    fs::create_dir_all(directory).map_err(|e| {
        VpnMetricsError::file_operation(format!(
            "Failed to create {}: {}",
            directory.display(),
            e
        ))
    })?;

    let destination = directory.join(file_name);
    let temp = directory.join(format!(".{}.{}.tmp", file_name, std::process::id()));

    fs::write(&temp, contents).map_err(|e| {
        VpnMetricsError::file_operation(format!("Failed to write {}: {}", temp.display(), e))
    })?;

    fs::rename(&temp, &destination).map_err(|e| {
        let _ = fs::remove_file(&temp);
        VpnMetricsError::file_operation(format!(
            "Failed to rename {} to {}: {}",
            temp.display(),
            destination.display(),
            e
        ))
    })?;

    Ok(destination)
}
