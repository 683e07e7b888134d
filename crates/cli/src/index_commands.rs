//! `qgis-plugins index`: build the static plugin repository site.

use std::path::Path;

use {
    anyhow::{Context, Result},
    qgis_plugins_config::InstallerConfig,
    qgis_plugins_repository::{generate, repository_url},
};

pub fn handle_index(config: &InstallerConfig, archives: &Path, output_dir: &Path) -> Result<()> {
    let summary = generate(archives, output_dir, config).with_context(|| {
        format!(
            "failed to generate repository from {} into {}",
            archives.display(),
            output_dir.display()
        )
    })?;

    println!(
        "Wrote plugins.xml and index.html for {} plugin(s), {} icon(s), to {}",
        summary.plugins,
        summary.icons,
        output_dir.display()
    );
    println!("Repository URL: {}", repository_url(config));
    Ok(())
}
