//! `plugins.xml` and `index.html` rendering.

use {askama::Template, qgis_plugins_config::InstallerConfig};

use crate::{catalog::CatalogEntry, error::Result};

/// Tags shown on an index card.
const CARD_TAG_LIMIT: usize = 5;

/// QGIS orders feed versions numerically, so the feed needs a real one.
const FEED_DEFAULT_VERSION: &str = "0.0.1";
const FEED_DEFAULT_QGIS_MINIMUM_VERSION: &str = "3.22";
const PAGE_DEFAULT_VERSION: &str = "Unknown";
const PAGE_DEFAULT_QGIS_MINIMUM_VERSION: &str = "3.0";

/// Template-facing view of one catalog entry. Absent links are empty
/// strings.
#[derive(Debug, Clone)]
pub struct PluginView {
    pub name: String,
    /// Version as published in `plugins.xml`.
    pub feed_version: String,
    /// Version as shown on the index page.
    pub version: String,
    pub description: String,
    pub about: String,
    pub feed_qgis_minimum_version: String,
    pub qgis_minimum_version: String,
    pub author: String,
    pub email: String,
    pub homepage: String,
    pub tracker: String,
    pub repository: String,
    pub experimental: bool,
    pub deprecated: bool,
    pub tags: Vec<String>,
    pub category: String,
    pub file_name: String,
    pub download_url: String,
    /// Icon reference for `plugins.xml`.
    pub icon: String,
    /// Extracted icon relative to the site root, empty when none.
    pub icon_path: String,
    pub size: String,
    pub date: String,
}

impl PluginView {
    pub fn new(entry: &CatalogEntry, icon_path: Option<String>, base_url: &str) -> Self {
        let meta = &entry.metadata;
        let icon = icon_path
            .clone()
            .unwrap_or_else(|| meta.icon_or_default().to_string());
        Self {
            name: meta.name.clone(),
            feed_version: or_default(meta.version.as_deref(), FEED_DEFAULT_VERSION),
            version: or_default(meta.version.as_deref(), PAGE_DEFAULT_VERSION),
            description: meta.description.clone(),
            about: meta.about.clone(),
            feed_qgis_minimum_version: or_default(
                meta.qgis_minimum_version.as_deref(),
                FEED_DEFAULT_QGIS_MINIMUM_VERSION,
            ),
            qgis_minimum_version: or_default(
                meta.qgis_minimum_version.as_deref(),
                PAGE_DEFAULT_QGIS_MINIMUM_VERSION,
            ),
            author: meta.author.clone(),
            email: meta.email.clone().unwrap_or_default(),
            homepage: meta.homepage.clone().unwrap_or_default(),
            tracker: meta.tracker.clone().unwrap_or_default(),
            repository: meta.repository.clone().unwrap_or_default(),
            experimental: meta.experimental,
            deprecated: meta.deprecated,
            tags: meta.tags.clone(),
            category: meta.category.clone(),
            file_name: entry.file_name.clone(),
            download_url: format!(
                "{}/plugins/{}",
                base_url.trim_end_matches('/'),
                entry.file_name
            ),
            icon,
            icon_path: icon_path.unwrap_or_default(),
            size: entry.size_label(),
            date: entry.modified.clone(),
        }
    }

    pub fn tags_joined(&self) -> String {
        self.tags.join(", ")
    }

    pub fn card_tags(&self) -> &[String] {
        &self.tags[..self.tags.len().min(CARD_TAG_LIMIT)]
    }

    /// QGIS spells booleans the Python way.
    pub fn experimental_flag(&self) -> &'static str {
        python_bool(self.experimental)
    }

    pub fn deprecated_flag(&self) -> &'static str {
        python_bool(self.deprecated)
    }

    /// Placeholder letter for cards without an icon.
    pub fn initial(&self) -> String {
        self.name
            .chars()
            .next()
            .map(|c| c.to_uppercase().collect())
            .unwrap_or_default()
    }
}

fn or_default(value: Option<&str>, default: &str) -> String {
    value.unwrap_or(default).to_string()
}

fn python_bool(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}

#[derive(Template)]
#[template(path = "plugins.xml", escape = "html")]
struct PluginsXmlTemplate<'a> {
    plugins: &'a [PluginView],
    uploaded_by: &'a str,
}

#[derive(Template)]
#[template(path = "index.html", escape = "html")]
struct IndexHtmlTemplate<'a> {
    title: &'a str,
    repository_url: &'a str,
    plugins: &'a [PluginView],
}

/// The repository feed QGIS reads when the repository is added.
pub fn render_plugins_xml(plugins: &[PluginView], config: &InstallerConfig) -> Result<String> {
    let template = PluginsXmlTemplate {
        plugins,
        uploaded_by: &config.repository.uploaded_by,
    };
    Ok(template.render()?)
}

/// Human-facing landing page listing every plugin.
pub fn render_index_html(plugins: &[PluginView], config: &InstallerConfig) -> Result<String> {
    let repository_url = repository_url(config);
    let template = IndexHtmlTemplate {
        title: &config.repository.title,
        repository_url: &repository_url,
        plugins,
    };
    Ok(template.render()?)
}

/// URL users paste into the QGIS plugin manager.
pub fn repository_url(config: &InstallerConfig) -> String {
    format!("{}/plugins.xml", config.base_url.trim_end_matches('/'))
}
