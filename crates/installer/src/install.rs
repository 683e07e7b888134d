//! The per-plugin install procedure.
//!
//! fetch → extract → locate root → delete existing → move → clean scratch.
//! Every failure is returned as an [`InstallError`]; nothing here aborts the
//! batch.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use {
    reqwest::Client,
    tracing::{debug, info},
    walkdir::WalkDir,
};

use crate::{
    error::InstallError,
    extract::{extract_archive, locate_plugin_root, remove_resource_forks},
    scratch::Scratch,
    source::{InstallRequest, fetch_archive},
};

/// How the archive laid out the plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootLayout {
    /// A top-level folder; its name is the install name.
    Nested,
    /// Loose files at the top level; installed under the requested name.
    Flat,
}

/// A successfully installed plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledPlugin {
    /// Identifier the plugin was requested under.
    pub name: String,
    /// Directory name under the QGIS plugins directory.
    pub install_name: String,
    pub path: PathBuf,
    pub layout: RootLayout,
}

#[derive(Debug, Clone)]
pub struct Installer {
    client: Option<Client>,
    target_root: PathBuf,
    scratch_root: PathBuf,
}

impl Installer {
    /// Installs into `target_root`, using the OS temp dir for scratch.
    /// Remote requests need [`Installer::with_client`].
    pub fn new(target_root: impl Into<PathBuf>) -> Self {
        Self {
            client: None,
            target_root: target_root.into(),
            scratch_root: std::env::temp_dir(),
        }
    }

    #[must_use]
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    #[must_use]
    pub fn with_scratch_root(mut self, scratch_root: impl Into<PathBuf>) -> Self {
        self.scratch_root = scratch_root.into();
        self
    }

    pub fn target_root(&self) -> &Path {
        &self.target_root
    }

    pub fn scratch_root(&self) -> &Path {
        &self.scratch_root
    }

    /// Install one plugin. Scratch storage is released before returning, on
    /// success and on every failure.
    pub async fn install(&self, request: &InstallRequest) -> Result<InstalledPlugin, InstallError> {
        let name = request.name.as_str();
        let scratch = Scratch::acquire(&self.scratch_root, name)
            .map_err(|e| InstallError::scratch(name, e))?;

        let result = self.install_in(request, &scratch).await;
        scratch.close();
        result
    }

    async fn install_in(
        &self,
        request: &InstallRequest,
        scratch: &Scratch,
    ) -> Result<InstalledPlugin, InstallError> {
        let name = request.name.clone();
        let archive = fetch_archive(self.client.as_ref(), request, scratch.archive_path()).await?;

        let extract_dir = scratch.extract_dir();
        let root = {
            let plugin = name.clone();
            let dest = extract_dir.clone();
            tokio::task::spawn_blocking(move || unpack(&plugin, &archive, &dest))
                .await
                .map_err(|e| InstallError::extract(&name, e))??
        };

        let (source_dir, install_name, layout) = match root {
            Some(dir) => {
                let install_name = dir
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| name.clone());
                (dir, install_name, RootLayout::Nested)
            },
            None => {
                debug!(plugin = %name, "archive has no top-level folder, installing whole tree");
                (extract_dir, name.clone(), RootLayout::Flat)
            },
        };

        let final_dir = self.target_root.join(&install_name);
        {
            let dest = final_dir.clone();
            tokio::task::spawn_blocking(move || replace_dir(&source_dir, &dest))
                .await
                .map_err(|e| InstallError::install(&name, &final_dir, e))?
                .map_err(|e| InstallError::install(&name, &final_dir, e))?;
        }

        info!(plugin = %name, path = %final_dir.display(), "installed plugin");
        Ok(InstalledPlugin {
            name,
            install_name,
            path: final_dir,
            layout,
        })
    }
}

/// Extract and find the plugin root. Blocking.
///
/// An archive with no extractable entries is an extraction failure rather
/// than an empty plugin folder. When there is no root folder, `__MACOSX` is
/// dropped so it does not end up inside the installed plugin.
fn unpack(plugin: &str, archive: &Path, dest: &Path) -> Result<Option<PathBuf>, InstallError> {
    let written = extract_archive(archive, dest).map_err(|e| InstallError::extract(plugin, e))?;
    if written == 0 {
        return Err(InstallError::extract(plugin, "archive contains no entries"));
    }
    let root = locate_plugin_root(dest).map_err(|e| InstallError::extract(plugin, e))?;
    if root.is_none() {
        remove_resource_forks(dest).map_err(|e| InstallError::extract(plugin, e))?;
    }
    Ok(root)
}

/// Delete whatever sits at `dest`, then move `source` there. Blocking.
fn replace_dir(source: &Path, dest: &Path) -> io::Result<()> {
    match fs::symlink_metadata(dest) {
        Ok(meta) if meta.is_dir() => {
            debug!(path = %dest.display(), "removing existing plugin directory");
            fs::remove_dir_all(dest)?;
        },
        Ok(_) => fs::remove_file(dest)?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {},
        Err(e) => return Err(e),
    }
    move_dir(source, dest)
}

/// `rename`, falling back to copy when source and destination live on
/// different filesystems. A partial copy is removed on failure.
fn move_dir(source: &Path, dest: &Path) -> io::Result<()> {
    move_dir_with(source, dest, |from, to| fs::rename(from, to))
}

fn move_dir_with(
    source: &Path,
    dest: &Path,
    rename: impl FnOnce(&Path, &Path) -> io::Result<()>,
) -> io::Result<()> {
    match rename(source, dest) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            debug!(from = %source.display(), to = %dest.display(), "rename crosses devices, copying");
            copy_tree(source, dest).inspect_err(|_| {
                let _ = fs::remove_dir_all(dest);
            })
        },
        Err(e) => Err(e),
    }
}

fn copy_tree(source: &Path, dest: &Path) -> io::Result<()> {
    for entry in WalkDir::new(source) {
        let entry = entry?;
        let relative = entry.path().strip_prefix(source).map_err(io::Error::other)?;
        let target = dest.join(relative);
        let file_type = entry.file_type();
        if file_type.is_dir() {
            fs::create_dir_all(&target)?;
        } else if file_type.is_file() {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
