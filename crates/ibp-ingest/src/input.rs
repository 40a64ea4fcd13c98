//! Input file selection.

use std::path::{Path, PathBuf};

use crate::error::{IngestError, Result};

/// Expand a file-or-directory path into the list of spreadsheets to ingest.
///
/// A file path yields itself. A directory yields its `.xlsx` entries sorted
/// by name, skipping Office lock files (`~$` prefix). Files are later
/// processed strictly in the returned order.
pub fn select_input_files(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.exists() {
        return Err(IngestError::InputNotFound(path.to_path_buf()));
    }

    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(path)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && is_ingestible(p))
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(IngestError::NoInputFiles(path.to_path_buf()));
    }

    Ok(files)
}

fn is_ingestible(path: &Path) -> bool {
    let is_xlsx = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("xlsx"));

    let is_lock_file = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with("~$"));

    is_xlsx && !is_lock_file
}
