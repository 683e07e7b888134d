/// Config schema types and the compiled-in defaults.
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Remote host serving `plugins/<name>.zip`.
pub const DEFAULT_BASE_URL: &str = "https://qgis.gishub.org";

/// Plugins installed by a plain remote run, in install order.
pub const DEFAULT_PLUGINS: &[&str] = &["geoai", "geemap", "leafmap", "samgeo", "timelapse"];

/// Root configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallerConfig {
    /// Base URL; archives are fetched from `{base_url}/plugins/{name}.zip`.
    pub base_url: String,
    /// Plugin identifiers, processed in this order.
    pub plugins: Vec<String>,
    /// Overrides the OS-specific QGIS plugins directory.
    pub plugins_dir: Option<PathBuf>,
    /// Overrides the scratch root (defaults to the OS temp dir).
    pub scratch_dir: Option<PathBuf>,
    pub repository: RepositoryConfig,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            plugins: DEFAULT_PLUGINS.iter().map(|name| (*name).to_string()).collect(),
            plugins_dir: None,
            scratch_dir: None,
            repository: RepositoryConfig::default(),
        }
    }
}

impl InstallerConfig {
    /// Remote archive URL for a plugin identifier.
    pub fn archive_url(&self, name: &str) -> String {
        format!("{}/plugins/{name}.zip", self.base_url.trim_end_matches('/'))
    }
}

/// Settings for the `plugins.xml` / `index.html` generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Value of `<uploaded_by>` in `plugins.xml`.
    pub uploaded_by: String,
    /// Page title of the generated `index.html`.
    pub title: String,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            uploaded_by: "giswqs".into(),
            title: "QGIS Plugin Repository".into(),
        }
    }
}
