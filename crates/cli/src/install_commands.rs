//! `qgis-plugins install` / `install-local`: console progress for a batch.
//!
//! Each plugin gets one `[ok]` or `[fail]` line as soon as it finishes,
//! followed by a summary line once the batch is done.

use std::{io::IsTerminal, path::PathBuf};

use {
    anyhow::Result,
    qgis_plugins_config::InstallerConfig,
    qgis_plugins_installer::{
        BatchReport, InstallError, InstallRequest, InstalledPlugin, Reporter, RootLayout,
        discover::default_archive_dir, install_local, install_remote,
    },
};

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const DIM: &str = "\x1b[2m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Prints per-plugin progress to stdout.
pub struct ConsoleReporter {
    color: bool,
}

impl ConsoleReporter {
    pub fn for_stdout() -> Self {
        Self {
            color: std::io::stdout().is_terminal(),
        }
    }

    /// `[ok] ...` or `[fail] ...`. Failure messages already name the plugin.
    fn outcome_line(&self, outcome: &std::result::Result<InstalledPlugin, InstallError>) -> String {
        match outcome {
            Ok(installed) => format!("{} {}", self.paint(GREEN, "[ok]"), ok_line(installed)),
            Err(e) => format!("{} {e}", self.paint(RED, "[fail]")),
        }
    }

    fn paint(&self, color: &str, text: &str) -> String {
        if self.color {
            format!("{BOLD}{color}{text}{RESET}")
        } else {
            text.to_string()
        }
    }
}

impl Reporter for ConsoleReporter {
    fn on_start(&mut self, position: usize, total: usize, request: &InstallRequest) {
        let progress = format!("({position}/{total})");
        println!("{} installing {}", self.paint(DIM, &progress), request.name);
    }

    fn on_outcome(
        &mut self,
        _request: &InstallRequest,
        outcome: &std::result::Result<InstalledPlugin, InstallError>,
    ) {
        println!("  {}", self.outcome_line(outcome));
    }
}

fn ok_line(installed: &InstalledPlugin) -> String {
    match installed.layout {
        RootLayout::Nested if installed.install_name != installed.name => format!(
            "{} installed as {} -> {}",
            installed.name,
            installed.install_name,
            installed.path.display()
        ),
        RootLayout::Nested => format!("{} -> {}", installed.name, installed.path.display()),
        RootLayout::Flat => format!(
            "{} (no top-level folder, installed whole archive) -> {}",
            installed.name,
            installed.path.display()
        ),
    }
}

pub fn summary_line(report: &BatchReport) -> String {
    format!(
        "{} installed, {} failed (target: {})",
        report.installed_count(),
        report.failed_count(),
        report.target_root.display()
    )
}

fn finish(report: &BatchReport) -> u8 {
    println!();
    println!("{}", summary_line(report));
    if report.is_success() {
        println!("Restart QGIS and enable the plugins in Plugins > Manage and Install Plugins.");
    }
    report.exit_code()
}

/// Remote variant. Returns the process exit status.
pub async fn handle_install(config: &InstallerConfig) -> Result<u8> {
    println!(
        "Installing {} plugin(s) from {}",
        config.plugins.len(),
        config.base_url
    );
    let report = install_remote(config, &mut ConsoleReporter::for_stdout()).await?;
    Ok(finish(&report))
}

/// Local variant over `dir`, or the default archive directory.
pub async fn handle_install_local(config: &InstallerConfig, dir: Option<PathBuf>) -> Result<u8> {
    let dir = dir.unwrap_or_else(default_archive_dir);
    println!("Installing plugin archives from {}", dir.display());
    let report = install_local(config, &dir, &mut ConsoleReporter::for_stdout()).await?;
    Ok(finish(&report))
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn installed(name: &str, install_name: &str, layout: RootLayout) -> InstalledPlugin {
        InstalledPlugin {
            name: name.into(),
            install_name: install_name.into(),
            path: PathBuf::from("/plugins").join(install_name),
            layout,
        }
    }

    #[test]
    fn ok_line_mentions_renamed_root() {
        assert_eq!(
            ok_line(&installed("geoai", "geoai", RootLayout::Nested)),
            "geoai -> /plugins/geoai"
        );
        assert_eq!(
            ok_line(&installed("foo", "foo-1.2.3", RootLayout::Nested)),
            "foo installed as foo-1.2.3 -> /plugins/foo-1.2.3"
        );
        assert!(ok_line(&installed("loose", "loose", RootLayout::Flat)).contains("no top-level folder"));
    }

    #[test]
    fn summary_counts_both_sides() {
        let report = BatchReport {
            target_root: PathBuf::from("/plugins"),
            installed: vec![installed("a", "a", RootLayout::Nested)],
            failed: vec![
                InstallError::extract("b", "bad zip"),
                InstallError::download("c", "http://h/c.zip", "HTTP 404"),
            ],
        };
        assert_eq!(summary_line(&report), "1 installed, 2 failed (target: /plugins)");
        assert_eq!(report.exit_code(), 2);
    }

    #[test]
    fn failure_line_names_the_plugin_once() {
        let reporter = ConsoleReporter { color: false };
        let line = reporter.outcome_line(&Err(InstallError::download(
            "beta",
            "http://h/plugins/beta.zip",
            "HTTP 404",
        )));
        assert_eq!(
            line,
            "[fail] beta: download from http://h/plugins/beta.zip failed: HTTP 404"
        );
        assert_eq!(line.matches("beta:").count(), 1);

        let ok = reporter.outcome_line(&Ok(installed("geoai", "geoai", RootLayout::Nested)));
        assert_eq!(ok, "[ok] geoai -> /plugins/geoai");
    }

    #[test]
    fn plain_output_has_no_escape_codes() {
        let reporter = ConsoleReporter { color: false };
        assert_eq!(reporter.paint(GREEN, "[ok]"), "[ok]");
        let colored = ConsoleReporter { color: true };
        assert!(colored.paint(RED, "[fail]").contains("\x1b[31m"));
    }
}
