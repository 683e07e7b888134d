//! OS → QGIS plugins directory lookup.
//!
//! The table is exhaustive: Linux, macOS and Windows are supported, every
//! other OS identifier is rejected.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::{Error, Result};

/// Path segments shared by every platform, below the per-OS data root.
const PROFILE_SEGMENTS: &[&str] = &["QGIS", "QGIS3", "profiles", "default", "python", "plugins"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    MacOs,
    Windows,
}

impl Platform {
    /// Map an OS identifier (`std::env::consts::OS` values, or the
    /// `uname`-style `Darwin`) to a supported platform.
    pub fn from_os(os: &str) -> Result<Self> {
        match os.to_ascii_lowercase().as_str() {
            "linux" => Ok(Self::Linux),
            "macos" | "darwin" => Ok(Self::MacOs),
            "windows" => Ok(Self::Windows),
            _ => Err(Error::unsupported_platform(os)),
        }
    }

    pub fn current() -> Result<Self> {
        Self::from_os(std::env::consts::OS)
    }

    /// Environment variable holding the base directory.
    pub fn base_var(self) -> &'static str {
        match self {
            Self::Linux | Self::MacOs => "HOME",
            Self::Windows => "APPDATA",
        }
    }

    fn separator(self) -> char {
        match self {
            Self::Linux | Self::MacOs => '/',
            Self::Windows => '\\',
        }
    }

    fn data_segments(self) -> &'static [&'static str] {
        match self {
            Self::Linux => &[".local", "share"],
            Self::MacOs => &["Library", "Application Support"],
            Self::Windows => &[],
        }
    }

    /// Build the plugins directory using `lookup` to read environment
    /// variables. Separators are the target platform's, not the host's.
    pub fn plugins_dir_with(self, lookup: impl Fn(&str) -> Option<String>) -> Result<PathBuf> {
        let var = self.base_var();
        let base = lookup(var)
            .filter(|value| !value.is_empty())
            .ok_or(Error::MissingEnv { var })?;

        let sep = self.separator();
        let mut path = base.trim_end_matches(sep).to_string();
        for segment in self.data_segments().iter().chain(PROFILE_SEGMENTS) {
            path.push(sep);
            path.push_str(segment);
        }
        Ok(PathBuf::from(path))
    }
}

/// Resolve the QGIS plugins directory for an OS identifier using the
/// process environment.
pub fn resolve_plugins_dir(os: &str) -> Result<PathBuf> {
    Platform::from_os(os)?.plugins_dir_with(|var| {
        std::env::var(var).ok().or_else(|| {
            (var == "HOME")
                .then(directories::BaseDirs::new)
                .flatten()
                .map(|dirs| dirs.home_dir().to_string_lossy().into_owned())
        })
    })
}

/// Create the plugins directory (and parents) if it does not exist yet.
pub fn ensure_plugins_dir(path: &Path) -> Result<()> {
    if path.is_dir() {
        return Ok(());
    }
    info!(path = %path.display(), "creating QGIS plugins directory");
    std::fs::create_dir_all(path)?;
    Ok(())
}
