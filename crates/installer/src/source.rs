//! Install requests and archive fetching.

use std::path::{Path, PathBuf};

use {
    qgis_plugins_config::InstallerConfig,
    reqwest::Client,
    tokio::io::AsyncWriteExt,
    tracing::{debug, info},
};

use crate::error::InstallError;

const USER_AGENT: &str = concat!("qgis-plugins/", env!("CARGO_PKG_VERSION"));

/// Where a plugin archive comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveSource {
    /// Fetched with a single HTTP GET.
    Remote { url: String },
    /// Already on disk; nothing to fetch.
    Local { path: PathBuf },
}

/// One plugin to install. Built at the start of a run, consumed once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRequest {
    /// Plugin identifier; also the fallback install directory name.
    pub name: String,
    pub source: ArchiveSource,
}

impl InstallRequest {
    pub fn remote(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: ArchiveSource::Remote { url: url.into() },
        }
    }

    /// Local archive; the plugin identifier is the file stem.
    pub fn local(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "plugin".into());
        Self {
            name,
            source: ArchiveSource::Local { path },
        }
    }
}

/// Requests for every configured plugin, in configured order.
pub fn remote_requests(config: &InstallerConfig) -> Vec<InstallRequest> {
    config
        .plugins
        .iter()
        .map(|name| InstallRequest::remote(name.as_str(), config.archive_url(name)))
        .collect()
}

/// Requests for a list of local archives, in the given order.
pub fn local_requests(archives: &[PathBuf]) -> Vec<InstallRequest> {
    archives.iter().map(InstallRequest::local).collect()
}

/// Shared HTTP client for all downloads in a run.
pub fn build_client() -> reqwest::Result<Client> {
    Client::builder().user_agent(USER_AGENT).build()
}

/// Make the archive for `request` available on disk and return its path.
///
/// Remote sources are downloaded into `scratch_file`; local sources are used
/// in place.
pub(crate) async fn fetch_archive(
    client: Option<&Client>,
    request: &InstallRequest,
    scratch_file: &Path,
) -> Result<PathBuf, InstallError> {
    match &request.source {
        ArchiveSource::Remote { url } => {
            let client = client
                .ok_or_else(|| InstallError::download(&request.name, url, "no network client"))?;
            let bytes = download(client, &request.name, url, scratch_file).await?;
            info!(plugin = %request.name, %url, bytes, "downloaded plugin archive");
            Ok(scratch_file.to_path_buf())
        },
        ArchiveSource::Local { path } => {
            debug!(plugin = %request.name, path = %path.display(), "using local archive");
            Ok(path.clone())
        },
    }
}

async fn download(client: &Client, plugin: &str, url: &str, dest: &Path) -> Result<u64, InstallError> {
    let mut resp = client
        .get(url)
        .send()
        .await
        .map_err(|e| InstallError::download(plugin, url, e))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(InstallError::download(plugin, url, format!("HTTP {status}")));
    }

    let mut file = tokio::fs::File::create(dest)
        .await
        .map_err(|e| InstallError::download(plugin, url, e))?;
    let mut written = 0u64;
    while let Some(chunk) = resp
        .chunk()
        .await
        .map_err(|e| InstallError::download(plugin, url, e))?
    {
        file.write_all(&chunk)
            .await
            .map_err(|e| InstallError::download(plugin, url, e))?;
        written += chunk.len() as u64;
    }
    file.flush()
        .await
        .map_err(|e| InstallError::download(plugin, url, e))?;

    Ok(written)
}
