//! Post-ingestion file archival.
//!
//! Successfully loaded files move into `<processed-root>/YYYY-MM/`. A name
//! collision in the target folder renames the incoming file with a timestamp
//! suffix instead of overwriting.

use anyhow::Context;
use chrono::Local;
use std::path::{Path, PathBuf};

/// Move `src` into the dated archive folder under `processed_root`.
/// Returns the final destination path.
pub fn archive_file(src: &Path, processed_root: &Path) -> anyhow::Result<PathBuf> {
    let month_folder = Local::now().format("%Y-%m").to_string();
    let dest_dir = processed_root.join(month_folder);
    std::fs::create_dir_all(&dest_dir)
        .with_context(|| format!("Failed to create archive directory {}", dest_dir.display()))?;

    let file_name = src
        .file_name()
        .with_context(|| format!("Cannot archive path without a file name: {}", src.display()))?;

    let mut dest = dest_dir.join(file_name);
    if dest.exists() {
        dest = dest_dir.join(collision_name(src));
    }

    std::fs::rename(src, &dest)
        .with_context(|| format!("Failed to move {} to {}", src.display(), dest.display()))?;

    tracing::info!(src = %src.display(), dest = %dest.display(), "Archived file");
    Ok(dest)
}

fn collision_name(src: &Path) -> String {
    let stem = src
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "file".to_string());
    let stamp = Local::now().format("%Y%m%d_%H%M%S");

    match src.extension() {
        Some(ext) => format!("{}__{}.{}", stem, stamp, ext.to_string_lossy()),
        None => format!("{}__{}", stem, stamp),
    }
}
