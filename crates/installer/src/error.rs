use std::{fmt, path::PathBuf};

use {crate::preflight::Capability, thiserror::Error};

/// Which step of the install procedure failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Scratch,
    Download,
    Extract,
    Install,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Scratch => "scratch storage",
            Self::Download => "download",
            Self::Extract => "extract",
            Self::Install => "install",
        })
    }
}

/// A failure confined to one plugin. The batch keeps going.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("{plugin}: could not allocate scratch storage: {reason}")]
    Scratch { plugin: String, reason: String },

    #[error("{plugin}: download from {url} failed: {reason}")]
    DownloadFailed {
        plugin: String,
        url: String,
        reason: String,
    },

    #[error("{plugin}: extraction failed: {reason}")]
    ExtractFailed { plugin: String, reason: String },

    #[error("{plugin}: install into {} failed: {reason}", .target.display())]
    InstallFailed {
        plugin: String,
        target: PathBuf,
        reason: String,
    },
}

impl InstallError {
    #[must_use]
    pub fn scratch(plugin: &str, reason: impl fmt::Display) -> Self {
        Self::Scratch {
            plugin: plugin.to_string(),
            reason: reason.to_string(),
        }
    }

    #[must_use]
    pub fn download(plugin: &str, url: &str, reason: impl fmt::Display) -> Self {
        Self::DownloadFailed {
            plugin: plugin.to_string(),
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    #[must_use]
    pub fn extract(plugin: &str, reason: impl fmt::Display) -> Self {
        Self::ExtractFailed {
            plugin: plugin.to_string(),
            reason: reason.to_string(),
        }
    }

    #[must_use]
    pub fn install(plugin: &str, target: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        Self::InstallFailed {
            plugin: plugin.to_string(),
            target: target.into(),
            reason: reason.to_string(),
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Scratch { .. } => FailureKind::Scratch,
            Self::DownloadFailed { .. } => FailureKind::Download,
            Self::ExtractFailed { .. } => FailureKind::Extract,
            Self::InstallFailed { .. } => FailureKind::Install,
        }
    }

    pub fn plugin(&self) -> &str {
        match self {
            Self::Scratch { plugin, .. }
            | Self::DownloadFailed { plugin, .. }
            | Self::ExtractFailed { plugin, .. }
            | Self::InstallFailed { plugin, .. } => plugin,
        }
    }
}

/// A failure that aborts the whole run before any plugin is attempted.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] qgis_plugins_config::Error),

    #[error("missing capability: {capability}: {reason}")]
    MissingCapability {
        capability: Capability,
        reason: String,
    },

    #[error("plugins directory not found: {}", .0.display())]
    ArchiveDirNotFound(PathBuf),

    #[error("no .zip files found in {}", .0.display())]
    NoArchivesFound(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RunError {
    #[must_use]
    pub fn missing_capability(capability: Capability, reason: impl fmt::Display) -> Self {
        Self::MissingCapability {
            capability,
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RunError>;
