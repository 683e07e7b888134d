//! Per-attempt scratch storage.
//!
//! Every install attempt owns one temp file (the downloaded archive) and one
//! temp directory (the extraction tree). Both are `tempfile` guards, so they
//! are removed when the [`Scratch`] is dropped, whichever way the attempt
//! ends.

use std::{
    io,
    path::{Path, PathBuf},
};

use {
    tempfile::{NamedTempFile, TempDir},
    tracing::{debug, warn},
};

/// Name of the extraction directory inside the scratch directory.
const CONTENTS_DIR: &str = "contents";

#[derive(Debug)]
pub struct Scratch {
    archive: NamedTempFile,
    dir: TempDir,
}

impl Scratch {
    /// Allocate a fresh temp file and temp dir under `root`.
    ///
    /// Names carry the plugin identifier plus a random suffix, so repeated or
    /// concurrent attempts never collide.
    pub fn acquire(root: &Path, plugin: &str) -> io::Result<Self> {
        let prefix = format!("qgis-plugin-{}-", file_safe(plugin));
        let archive = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(".zip")
            .tempfile_in(root)?;
        let dir = tempfile::Builder::new().prefix(&prefix).tempdir_in(root)?;
        debug!(
            archive = %archive.path().display(),
            dir = %dir.path().display(),
            "allocated scratch storage"
        );
        Ok(Self { archive, dir })
    }

    pub fn archive_path(&self) -> &Path {
        self.archive.path()
    }

    /// Directory the archive is extracted into. Created by the extractor.
    pub fn extract_dir(&self) -> PathBuf {
        self.dir.path().join(CONTENTS_DIR)
    }

    /// Remove both scratch entries now, logging (not failing) on errors.
    /// Entries that are already gone are fine.
    pub fn close(self) {
        let Self { archive, dir } = self;
        if let Err(e) = archive.close()
            && e.kind() != io::ErrorKind::NotFound
        {
            warn!(error = %e, "failed to remove scratch archive");
        }
        if let Err(e) = dir.close()
            && e.kind() != io::ErrorKind::NotFound
        {
            warn!(error = %e, "failed to remove scratch directory");
        }
    }
}

fn file_safe(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
