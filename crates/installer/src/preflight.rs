//! Checks run before any plugin is attempted.

use std::{
    fmt,
    io::{Cursor, Read, Write},
    path::Path,
};

use {
    tracing::debug,
    zip::{CompressionMethod, ZipArchive, ZipWriter, write::SimpleFileOptions},
};

use crate::{
    error::{Result, RunError},
    source::build_client,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Temp files and directories can be created under the scratch root.
    ScratchStorage,
    /// Deflate-compressed zip archives can be read.
    ArchiveExtraction,
    /// An HTTP(S) client can be constructed.
    NetworkClient,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ScratchStorage => "scratch storage",
            Self::ArchiveExtraction => "archive extraction",
            Self::NetworkClient => "network client",
        })
    }
}

/// What a remote run needs.
pub const REMOTE: &[Capability] = &[
    Capability::ScratchStorage,
    Capability::ArchiveExtraction,
    Capability::NetworkClient,
];

/// What a local run needs.
pub const LOCAL: &[Capability] = &[Capability::ScratchStorage, Capability::ArchiveExtraction];

const PROBE_BODY: &str = "qgis plugin installer probe";

impl Capability {
    pub fn check(self, scratch_root: &Path) -> Result<()> {
        let outcome = match self {
            Self::ScratchStorage => probe_scratch(scratch_root),
            Self::ArchiveExtraction => probe_zip(),
            Self::NetworkClient => build_client().map(drop).map_err(|e| e.to_string()),
        };
        outcome.map_err(|reason| RunError::missing_capability(self, reason))?;
        debug!(capability = %self, "capability available");
        Ok(())
    }
}

/// Check every capability in order; the first missing one aborts.
pub fn check_all(capabilities: &[Capability], scratch_root: &Path) -> Result<()> {
    capabilities
        .iter()
        .try_for_each(|capability| capability.check(scratch_root))
}

fn probe_scratch(root: &Path) -> std::result::Result<(), String> {
    let dir = tempfile::Builder::new()
        .prefix("qgis-plugin-probe-")
        .tempdir_in(root)
        .map_err(|e| format!("{}: {e}", root.display()))?;
    std::fs::write(dir.path().join("probe"), PROBE_BODY)
        .map_err(|e| format!("{}: {e}", dir.path().display()))?;
    dir.close().map_err(|e| e.to_string())
}

fn probe_zip() -> std::result::Result<(), String> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    writer
        .start_file("probe.txt", options)
        .map_err(|e| e.to_string())?;
    writer
        .write_all(PROBE_BODY.as_bytes())
        .map_err(|e| e.to_string())?;
    let bytes = writer.finish().map_err(|e| e.to_string())?.into_inner();

    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(|e| e.to_string())?;
    let mut entry = archive.by_index(0).map_err(|e| e.to_string())?;
    let mut body = String::new();
    entry.read_to_string(&mut body).map_err(|e| e.to_string())?;
    if body != PROBE_BODY {
        return Err("round-trip produced different content".into());
    }
    Ok(())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_capabilities_present_in_test_environment() {
        let tmp = tempfile::tempdir().unwrap();
        check_all(REMOTE, tmp.path()).unwrap();
        check_all(LOCAL, tmp.path()).unwrap();
    }

    #[test]
    fn unusable_scratch_root_is_a_missing_capability() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("nope");

        let err = check_all(LOCAL, &missing).unwrap_err();
        match err {
            RunError::MissingCapability { capability, .. } => {
                assert_eq!(capability, Capability::ScratchStorage);
            },
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn messages_are_distinct() {
        let labels: Vec<String> = REMOTE.iter().map(ToString::to_string).collect();
        assert_eq!(
            labels,
            vec!["scratch storage", "archive extraction", "network client"]
        );
    }
}
