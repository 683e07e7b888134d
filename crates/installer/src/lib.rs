//! QGIS plugin installation: fetch a zip, extract it to scratch storage,
//! move the plugin folder into the QGIS plugins directory, clean up.
//!
//! [`driver`] runs that procedure over a whole plugin list, remote
//! (`{base_url}/plugins/<name>.zip`) or local (`*.zip` in a directory).

pub mod discover;
pub mod driver;
pub mod error;
pub mod extract;
pub mod install;
pub mod preflight;
pub mod scratch;
pub mod source;

pub use {
    driver::{
        BatchReport, NoopReporter, Reporter, install_local, install_remote, resolve_target_root,
        run_batch,
    },
    error::{FailureKind, InstallError, RunError},
    install::{InstalledPlugin, Installer, RootLayout},
    preflight::Capability,
    source::{ArchiveSource, InstallRequest, build_client},
};
