//! Batch orchestration: run the install procedure over a list of requests,
//! strictly in order, and tally the outcome.
//!
//! A failed plugin is recorded and the batch moves on; only pre-flight
//! problems stop a run.

use std::path::{Path, PathBuf};

use {
    qgis_plugins_config::{InstallerConfig, ensure_plugins_dir, resolve_plugins_dir},
    tracing::info,
};

use crate::{
    discover::discover_archives,
    error::{InstallError, Result, RunError},
    install::{InstalledPlugin, Installer},
    preflight::{self, Capability},
    source::{InstallRequest, build_client, local_requests, remote_requests},
};

/// Receives progress as the batch runs. Output happens per plugin, not at
/// the end.
pub trait Reporter {
    fn on_start(&mut self, _position: usize, _total: usize, _request: &InstallRequest) {}

    fn on_outcome(
        &mut self,
        request: &InstallRequest,
        outcome: &std::result::Result<InstalledPlugin, InstallError>,
    );
}

/// Discards all progress.
#[derive(Debug, Default)]
pub struct NoopReporter;

impl Reporter for NoopReporter {
    fn on_outcome(
        &mut self,
        _request: &InstallRequest,
        _outcome: &std::result::Result<InstalledPlugin, InstallError>,
    ) {
    }
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub target_root: PathBuf,
    pub installed: Vec<InstalledPlugin>,
    pub failed: Vec<InstallError>,
}

impl BatchReport {
    pub fn installed_count(&self) -> usize {
        self.installed.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Process exit status: the number of failed plugins, saturating at 255.
    pub fn exit_code(&self) -> u8 {
        u8::try_from(self.failed_count()).unwrap_or(u8::MAX)
    }
}

/// Install every request in order. Never stops early.
pub async fn run_batch(
    installer: &Installer,
    requests: &[InstallRequest],
    reporter: &mut impl Reporter,
) -> BatchReport {
    let mut report = BatchReport {
        target_root: installer.target_root().to_path_buf(),
        ..Default::default()
    };

    let total = requests.len();
    for (position, request) in requests.iter().enumerate() {
        reporter.on_start(position + 1, total, request);
        let outcome = installer.install(request).await;
        reporter.on_outcome(request, &outcome);
        match outcome {
            Ok(installed) => report.installed.push(installed),
            Err(e) => {
                info!(plugin = %request.name, kind = %e.kind(), error = %e, "plugin install failed");
                report.failed.push(e);
            },
        }
    }

    info!(
        installed = report.installed_count(),
        failed = report.failed_count(),
        "batch finished"
    );
    report
}

/// Target root for `config`: the configured override, or the QGIS plugins
/// directory of the running OS. Does not create it.
pub fn resolve_target_root(config: &InstallerConfig) -> Result<PathBuf> {
    match &config.plugins_dir {
        Some(dir) => Ok(dir.clone()),
        None => Ok(resolve_plugins_dir(std::env::consts::OS)?),
    }
}

fn scratch_root(config: &InstallerConfig) -> PathBuf {
    config
        .scratch_dir
        .clone()
        .unwrap_or_else(std::env::temp_dir)
}

/// Remote variant: pre-flight, then fetch and install every configured
/// plugin.
pub async fn install_remote(
    config: &InstallerConfig,
    reporter: &mut impl Reporter,
) -> Result<BatchReport> {
    let target_root = resolve_target_root(config)?;
    let scratch_root = scratch_root(config);
    preflight::check_all(preflight::REMOTE, &scratch_root)?;
    let client = build_client()
        .map_err(|e| RunError::missing_capability(Capability::NetworkClient, e))?;
    ensure_plugins_dir(&target_root)?;

    let installer = Installer::new(target_root)
        .with_client(client)
        .with_scratch_root(scratch_root);
    let requests = remote_requests(config);
    Ok(run_batch(&installer, &requests, reporter).await)
}

/// Local variant: pre-flight, discover `*.zip` in `archive_dir`, install
/// each.
pub async fn install_local(
    config: &InstallerConfig,
    archive_dir: &Path,
    reporter: &mut impl Reporter,
) -> Result<BatchReport> {
    let target_root = resolve_target_root(config)?;
    let scratch_root = scratch_root(config);
    preflight::check_all(preflight::LOCAL, &scratch_root)?;
    let archives = discover_archives(archive_dir)?;
    ensure_plugins_dir(&target_root)?;

    let installer = Installer::new(target_root).with_scratch_root(scratch_root);
    let requests = local_requests(&archives);
    Ok(run_batch(&installer, &requests, reporter).await)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, crate::error::FailureKind};

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl Reporter for Recorder {
        fn on_start(&mut self, position: usize, total: usize, request: &InstallRequest) {
            self.events
                .push(format!("start {position}/{total} {}", request.name));
        }

        fn on_outcome(
            &mut self,
            request: &InstallRequest,
            outcome: &std::result::Result<InstalledPlugin, InstallError>,
        ) {
            let status = if outcome.is_ok() { "ok" } else { "fail" };
            self.events.push(format!("{status} {}", request.name));
        }
    }

    #[test]
    fn exit_code_saturates() {
        let mut report = BatchReport::default();
        assert_eq!(report.exit_code(), 0);
        assert!(report.is_success());

        for i in 0..300 {
            report
                .failed
                .push(InstallError::extract(&format!("p{i}"), "bad"));
        }
        assert_eq!(report.exit_code(), u8::MAX);
        assert!(!report.is_success());
    }

    #[tokio::test]
    async fn failures_do_not_stop_the_batch() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("target");
        std::fs::create_dir_all(&target).unwrap();
        let good = tmp.path().join("good.zip");
        crate::extract::tests::write_zip(&good, &[("good_plugin/__init__.py", "")]);

        let requests = vec![
            InstallRequest::local(tmp.path().join("missing.zip")),
            InstallRequest::local(&good),
        ];
        let installer = Installer::new(&target).with_scratch_root(tmp.path());
        let mut recorder = Recorder::default();

        let report = run_batch(&installer, &requests, &mut recorder).await;

        assert_eq!(report.installed_count(), 1);
        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.failed[0].kind(), FailureKind::Extract);
        assert_eq!(report.exit_code(), 1);
        assert_eq!(
            recorder.events,
            vec![
                "start 1/2 missing",
                "fail missing",
                "start 2/2 good",
                "ok good"
            ]
        );
        assert!(target.join("good_plugin/__init__.py").is_file());
    }

    #[test]
    fn configured_plugins_dir_overrides_platform_lookup() {
        let config = InstallerConfig {
            plugins_dir: Some(PathBuf::from("/opt/qgis/plugins")),
            ..Default::default()
        };
        assert_eq!(
            resolve_target_root(&config).unwrap(),
            PathBuf::from("/opt/qgis/plugins")
        );
    }

    #[tokio::test]
    async fn local_run_creates_target_and_installs() {
        let tmp = tempfile::tempdir().unwrap();
        let archives = tmp.path().join("plugins");
        std::fs::create_dir_all(&archives).unwrap();
        crate::extract::tests::write_zip(
            &archives.join("geoai.zip"),
            &[("geoai/__init__.py", ""), ("geoai/metadata.txt", "[general]\n")],
        );
        let target = tmp.path().join("profile/python/plugins");
        let config = InstallerConfig {
            plugins_dir: Some(target.clone()),
            scratch_dir: Some(tmp.path().to_path_buf()),
            ..Default::default()
        };

        let report = install_local(&config, &archives, &mut NoopReporter)
            .await
            .unwrap();
        assert!(report.is_success());
        assert_eq!(report.target_root, target);
        assert!(target.join("geoai/__init__.py").is_file());
    }

    #[tokio::test]
    async fn local_run_without_archives_attempts_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let archives = tmp.path().join("plugins");
        std::fs::create_dir_all(&archives).unwrap();
        let config = InstallerConfig {
            plugins_dir: Some(tmp.path().join("target")),
            scratch_dir: Some(tmp.path().to_path_buf()),
            ..Default::default()
        };

        let err = install_local(&config, &archives, &mut NoopReporter)
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::NoArchivesFound(_)));
        assert!(!tmp.path().join("target").exists());
    }
}
