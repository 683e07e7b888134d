//! Pulling plugin icons out of archives for the index page.

use std::{
    fs::File,
    io,
    path::{Path, PathBuf},
};

use {
    tracing::{debug, info},
    zip::ZipArchive,
};

use crate::error::Result;

/// Subdirectory of the output directory holding extracted icons.
pub const ICONS_DIR: &str = "icons";

const SKIPPED_ICON_WORDS: [&str; 3] = ["about", "settings", "logo"];

/// Pick the archive entry to use as the icon of `plugin`.
///
/// In order: the metadata icon (relative to the plugin folder, then as
/// given), the conventional locations, any `icon.png`/`icon.svg`, and
/// finally any image under an `icons/` folder that is not an about,
/// settings or logo image.
pub fn find_icon_entry<'a>(
    names: &'a [String],
    plugin: &str,
    metadata_icon: Option<&str>,
) -> Option<&'a str> {
    let exact = move |wanted: &str| names.iter().find(|n| *n == wanted).map(String::as_str);

    if let Some(icon) = metadata_icon {
        let icon = icon.trim_start_matches("./");
        if let Some(found) = exact(&format!("{plugin}/{icon}")).or_else(|| exact(icon)) {
            return Some(found);
        }
    }

    for ext in ["png", "svg"] {
        let conventional = [
            format!("{plugin}/icons/icon.{ext}"),
            format!("{plugin}/icon.{ext}"),
            format!("{plugin}/icons/{plugin}.{ext}"),
        ];
        if let Some(found) = conventional.iter().find_map(|c| exact(c)) {
            return Some(found);
        }
    }

    if let Some(found) = names
        .iter()
        .find(|n| n.ends_with("icon.png") || n.ends_with("icon.svg"))
    {
        return Some(found);
    }

    names
        .iter()
        .find(|n| {
            let lower = n.to_lowercase();
            lower.contains("/icons/")
                && (lower.ends_with(".png") || lower.ends_with(".svg"))
                && !SKIPPED_ICON_WORDS.iter().any(|w| lower.contains(w))
        })
        .map(String::as_str)
}

/// Copy the icon of `plugin` from `archive_path` to
/// `<output_dir>/icons/<plugin><ext>`.
///
/// Returns the path relative to `output_dir`, or `None` when the archive
/// has no usable icon.
pub fn extract_icon(
    archive_path: &Path,
    plugin: &str,
    metadata_icon: Option<&str>,
    output_dir: &Path,
) -> Result<Option<String>> {
    let mut archive = ZipArchive::new(File::open(archive_path)?)?;
    let mut names = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        names.push(archive.by_index(index)?.name().to_string());
    }

    let Some(entry_name) = find_icon_entry(&names, plugin, metadata_icon) else {
        debug!(plugin, "no icon found in archive");
        return Ok(None);
    };

    let ext = Path::new(entry_name)
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "png".into());
    let file_name = format!("{plugin}.{ext}");
    let icons_dir = output_dir.join(ICONS_DIR);
    std::fs::create_dir_all(&icons_dir)?;
    let dest: PathBuf = icons_dir.join(&file_name);

    let mut entry = archive.by_name(entry_name)?;
    let mut out = File::create(&dest)?;
    io::copy(&mut entry, &mut out)?;

    info!(plugin, entry = entry_name, "extracted plugin icon");
    Ok(Some(format!("{ICONS_DIR}/{file_name}")))
}
