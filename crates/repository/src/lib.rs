//! Static QGIS plugin repository generation.
//!
//! Reads every plugin archive in a directory and writes the `plugins.xml`
//! feed QGIS consumes, a browsable `index.html`, and the plugin icons the
//! page links to.

pub mod catalog;
pub mod error;
pub mod icons;
pub mod metadata;
pub mod render;

use std::path::Path;

use {qgis_plugins_config::InstallerConfig, tracing::{info, warn}};

pub use {
    catalog::{CatalogEntry, format_size, scan_catalog},
    error::{Error, Result},
    icons::{extract_icon, find_icon_entry},
    metadata::{PluginMetadata, parse_ini, read_metadata},
    render::{PluginView, render_index_html, render_plugins_xml, repository_url},
};

/// What [`generate`] wrote.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GenerateSummary {
    pub plugins: usize,
    pub icons: usize,
}

/// Build the repository site for the archives in `plugins_dir` into
/// `output_dir`.
///
/// An archive whose icon cannot be extracted is still listed.
pub fn generate(
    plugins_dir: &Path,
    output_dir: &Path,
    config: &InstallerConfig,
) -> Result<GenerateSummary> {
    let entries = scan_catalog(plugins_dir)?;
    std::fs::create_dir_all(output_dir)?;

    let mut summary = GenerateSummary {
        plugins: entries.len(),
        ..Default::default()
    };
    let mut views = Vec::with_capacity(entries.len());
    for entry in &entries {
        let icon = match extract_icon(
            &entry.path,
            &entry.stem,
            entry.metadata.icon.as_deref(),
            output_dir,
        ) {
            Ok(icon) => icon,
            Err(e) => {
                warn!(archive = %entry.path.display(), error = %e, "could not extract icon");
                None
            },
        };
        if icon.is_some() {
            summary.icons += 1;
        }
        views.push(PluginView::new(entry, icon, &config.base_url));
    }

    std::fs::write(
        output_dir.join("plugins.xml"),
        render_plugins_xml(&views, config)?,
    )?;
    std::fs::write(
        output_dir.join("index.html"),
        render_index_html(&views, config)?,
    )?;

    info!(
        plugins = summary.plugins,
        icons = summary.icons,
        output = %output_dir.display(),
        "generated plugin repository"
    );
    Ok(summary)
}
