//! Scanning a directory of plugin archives.

use std::{
    path::{Path, PathBuf},
    time::SystemTime,
};

use {
    time::OffsetDateTime,
    tracing::{debug, warn},
};

use crate::{
    error::Result,
    metadata::{PluginMetadata, read_metadata},
};

/// A plugin archive with readable metadata.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub path: PathBuf,
    /// Archive file name, e.g. `geoai.zip`.
    pub file_name: String,
    /// File name without extension; used for the icon file name.
    pub stem: String,
    pub metadata: PluginMetadata,
    pub size_bytes: u64,
    /// `YYYY-MM-DD` of the `metadata.txt` entry, or of the archive file's
    /// modification time (UTC) when the entry carries none.
    pub modified: String,
}

impl CatalogEntry {
    pub fn size_label(&self) -> String {
        format_size(self.size_bytes)
    }
}

/// Human readable size with one decimal, e.g. `1.5 MB`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

    #[allow(clippy::cast_precision_loss)]
    let mut size = bytes as f64;
    for unit in UNITS {
        if size < 1024.0 {
            return format!("{size:.1} {unit}");
        }
        size /= 1024.0;
    }
    format!("{size:.1} TB")
}

/// `YYYY-MM-DD` in UTC.
pub fn format_date(at: SystemTime) -> String {
    let at = OffsetDateTime::from(at);
    format!(
        "{:04}-{:02}-{:02}",
        at.year(),
        u8::from(at.month()),
        at.day()
    )
}

/// Every `*.zip` in `dir` that carries a `[general]` metadata section,
/// sorted case-insensitively by plugin name.
///
/// A missing directory yields an empty catalog. Unreadable archives are
/// logged and skipped.
pub fn scan_catalog(dir: &Path) -> Result<Vec<CatalogEntry>> {
    if !dir.is_dir() {
        debug!(dir = %dir.display(), "plugins directory missing, catalog is empty");
        return Ok(Vec::new());
    }

    let mut archives: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"))
        })
        .collect();
    archives.sort();

    let mut entries = Vec::with_capacity(archives.len());
    for path in archives {
        let metadata = match read_metadata(&path) {
            Ok(Some(metadata)) => metadata,
            Ok(None) => {
                debug!(archive = %path.display(), "skipping archive without metadata");
                continue;
            },
            Err(e) => {
                warn!(archive = %path.display(), error = %e, "skipping unreadable archive");
                continue;
            },
        };

        let stat = std::fs::metadata(&path)?;
        let modified = match &metadata.updated {
            Some(date) => date.clone(),
            None => stat
                .modified()
                .map(format_date)
                .unwrap_or_else(|_| format_date(SystemTime::now())),
        };
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = path
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        entries.push(CatalogEntry {
            file_name,
            stem,
            metadata,
            size_bytes: stat.len(),
            modified,
            path,
        });
    }

    entries.sort_by_key(|entry| entry.metadata.name.to_lowercase());
    Ok(entries)
}
