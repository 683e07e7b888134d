//! Configuration for the QGIS plugin installer.
//!
//! Defaults are compiled in (base URL, plugin list). An optional
//! `qgis-plugins.toml` is searched in `./` then `~/.config/qgis-plugins/`
//! and may override any of them.
//!
//! Also hosts the platform table that maps the running OS to the QGIS
//! plugins directory.

pub mod error;
pub mod loader;
pub mod platform;
pub mod schema;

pub use {
    error::{Error, Result},
    loader::{config_dir, discover_and_load, load_config},
    platform::{Platform, ensure_plugins_dir, resolve_plugins_dir},
    schema::{DEFAULT_BASE_URL, DEFAULT_PLUGINS, InstallerConfig, RepositoryConfig},
};
