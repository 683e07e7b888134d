//! `metadata.txt` parsing.
//!
//! QGIS plugins describe themselves in an INI file. Only the `[general]`
//! section matters here.

use std::{collections::BTreeMap, fs::File, io::Read, path::Path};

use {
    tracing::debug,
    zip::{DateTime, ZipArchive},
};

use crate::error::{Error, Result};

/// One INI section: lowercased keys to values.
pub type Section = BTreeMap<String, String>;

const METADATA_FILE: &str = "metadata.txt";

const DEFAULT_CATEGORY: &str = "Plugins";
const DEFAULT_ICON: &str = "icons/icon.png";

/// Parse INI text into sections.
///
/// Accepts `key = value` and `key: value`, full-line `#` and `;` comments,
/// and indented continuation lines. Keys are lowercased. Lines outside any
/// section and lines without a separator are ignored.
pub fn parse_ini(text: &str) -> BTreeMap<String, Section> {
    let mut sections: BTreeMap<String, Section> = BTreeMap::new();
    let mut section: Option<String> = None;
    let mut key: Option<String> = None;
    let mut blank_run = 0usize;

    for raw in text.lines() {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            blank_run += 1;
            continue;
        }
        if trimmed.starts_with('#') || trimmed.starts_with(';') {
            continue;
        }

        let indented = raw.starts_with(char::is_whitespace);
        if indented
            && let (Some(sec), Some(k)) = (&section, &key)
            && let Some(value) = sections.get_mut(sec).and_then(|s| s.get_mut(k))
        {
            for _ in 0..blank_run {
                value.push('\n');
            }
            if !value.is_empty() {
                value.push('\n');
            }
            value.push_str(trimmed);
            blank_run = 0;
            continue;
        }
        blank_run = 0;

        if let Some(name) = trimmed
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
        {
            let name = name.trim().to_string();
            sections.entry(name.clone()).or_default();
            section = Some(name);
            key = None;
            continue;
        }

        let Some(sec) = &section else {
            continue;
        };
        let Some(split) = trimmed.find(['=', ':']) else {
            key = None;
            continue;
        };
        let k = trimmed[..split].trim().to_lowercase();
        let v = trimmed[split + 1..].trim().to_string();
        if k.is_empty() {
            key = None;
            continue;
        }
        sections.entry(sec.clone()).or_default().insert(k.clone(), v);
        key = Some(k);
    }

    sections
}

/// The `[general]` section of a plugin's `metadata.txt`, with defaults
/// applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginMetadata {
    pub name: String,
    /// Absent when the metadata omits it; feed and page default differently.
    pub version: Option<String>,
    pub description: String,
    pub about: String,
    pub qgis_minimum_version: Option<String>,
    pub author: String,
    pub email: Option<String>,
    pub homepage: Option<String>,
    pub tracker: Option<String>,
    pub repository: Option<String>,
    pub experimental: bool,
    pub deprecated: bool,
    pub tags: Vec<String>,
    pub category: String,
    /// Icon path as written in the metadata, if any.
    pub icon: Option<String>,
    /// `YYYY-MM-DD` timestamp of the `metadata.txt` entry inside the
    /// archive. Set by [`read_metadata`].
    pub updated: Option<String>,
}

impl PluginMetadata {
    /// Build from a `[general]` section. `fallback_name` is used when the
    /// section has no `name`.
    pub fn from_section(section: &Section, fallback_name: &str) -> Self {
        let get = |key: &str| {
            section
                .get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        let flag = |key: &str| get(key).is_some_and(|v| v.eq_ignore_ascii_case("true"));

        let description = get("description").unwrap_or_else(|| "No description available.".into());
        Self {
            name: get("name").unwrap_or_else(|| fallback_name.to_string()),
            version: get("version"),
            about: get("about").unwrap_or_else(|| description.clone()),
            description,
            qgis_minimum_version: get("qgisminimumversion"),
            author: get("author").unwrap_or_else(|| "Unknown".into()),
            email: get("email"),
            homepage: get("homepage"),
            tracker: get("tracker"),
            repository: get("repository"),
            experimental: flag("experimental"),
            deprecated: flag("deprecated"),
            tags: get("tags")
                .map(|tags| {
                    tags.split(',')
                        .map(str::trim)
                        .filter(|t| !t.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            category: get("category").unwrap_or_else(|| DEFAULT_CATEGORY.into()),
            icon: get("icon"),
            updated: None,
        }
    }

    /// Icon path for `plugins.xml` when none was extracted.
    pub fn icon_or_default(&self) -> &str {
        self.icon.as_deref().unwrap_or(DEFAULT_ICON)
    }
}

/// Read `metadata.txt` from a plugin archive.
///
/// Uses the first entry whose name ends in `metadata.txt`. Returns `None`
/// when there is no such entry or it has no `[general]` section.
pub fn read_metadata(archive_path: &Path) -> Result<Option<PluginMetadata>> {
    let mut archive = ZipArchive::new(File::open(archive_path)?)?;
    let fallback = archive_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if !entry.name().ends_with(METADATA_FILE) {
            continue;
        }

        let updated = entry.last_modified().map(format_entry_date);
        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes)?;
        let text = String::from_utf8(bytes).map_err(|_| Error::InvalidUtf8 {
            archive: archive_path.to_path_buf(),
            entry: entry.name().to_string(),
        })?;
        return Ok(parse_ini(&text).get("general").map(|general| PluginMetadata {
            updated,
            ..PluginMetadata::from_section(general, &fallback)
        }));
    }

    debug!(archive = %archive_path.display(), "no metadata.txt in archive");
    Ok(None)
}

/// `YYYY-MM-DD` of a zip entry timestamp.
pub fn format_entry_date(at: DateTime) -> String {
    format!("{:04}-{:02}-{:02}", at.year(), at.month(), at.day())
}
