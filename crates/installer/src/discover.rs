//! Finding plugin archives for a local run.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, RunError};

/// Directory holding archives for a local run: `plugins/` next to the
/// executable, or `./plugins` when that does not exist.
pub fn default_archive_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("plugins")))
        .filter(|dir| dir.is_dir())
        .unwrap_or_else(|| PathBuf::from("plugins"))
}

/// Every `*.zip` directly inside `dir`, sorted by file name.
///
/// A missing directory and a directory without archives are both fatal.
pub fn discover_archives(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(RunError::ArchiveDirNotFound(dir.to_path_buf()));
    }

    let mut archives = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_zip = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"));
        if is_zip && path.is_file() {
            archives.push(path);
        }
    }

    if archives.is_empty() {
        return Err(RunError::NoArchivesFound(dir.to_path_buf()));
    }

    archives.sort();
    debug!(dir = %dir.display(), count = archives.len(), "discovered plugin archives");
    Ok(archives)
}
