use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{Result, schema::InstallerConfig};

const CONFIG_FILENAME: &str = "qgis-plugins.toml";

/// Load config from the given TOML file.
pub fn load_config(path: &Path) -> Result<InstallerConfig> {
    let raw = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&raw)?)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./qgis-plugins.toml` (project-local)
/// 2. `~/.config/qgis-plugins/qgis-plugins.toml` (user-global)
///
/// Returns `InstallerConfig::default()` if no config file is found or the
/// file cannot be parsed.
pub fn discover_and_load() -> InstallerConfig {
    let Some(path) = find_config_file() else {
        debug!("no config file found, using defaults");
        return InstallerConfig::default();
    };

    debug!(path = %path.display(), "loading config");
    match load_config(&path) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            InstallerConfig::default()
        },
    }
}

fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILENAME);
    if local.is_file() {
        return Some(local);
    }

    config_dir()
        .map(|dir| dir.join(CONFIG_FILENAME))
        .filter(|p| p.is_file())
}

/// Returns the user-global config directory (`~/.config/qgis-plugins/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "qgis-plugins").map(|d| d.config_dir().to_path_buf())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_overrides_from_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(CONFIG_FILENAME);
        std::fs::write(
            &path,
            r#"
base_url = "http://localhost:8000"
plugins = ["alpha", "beta"]
plugins_dir = "/opt/qgis/plugins"

[repository]
uploaded_by = "someone"
"#,
        )
        .unwrap();

        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.base_url, "http://localhost:8000");
        assert_eq!(cfg.plugins, vec!["alpha", "beta"]);
        assert_eq!(cfg.plugins_dir, Some(PathBuf::from("/opt/qgis/plugins")));
        assert_eq!(cfg.repository.uploaded_by, "someone");
        assert_eq!(cfg.repository.title, "QGIS Plugin Repository");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "plugins = not-a-list").unwrap();

        assert!(matches!(load_config(&path), Err(crate::Error::TomlDe(_))));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let result = load_config(&tmp.path().join("absent.toml"));
        assert!(matches!(result, Err(crate::Error::Io(_))));
    }
}
