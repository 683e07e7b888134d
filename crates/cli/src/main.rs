mod index_commands;
mod install_commands;

use std::{path::PathBuf, process::ExitCode};

use {
    anyhow::Context,
    clap::{Parser, Subcommand},
    qgis_plugins_config::{InstallerConfig, discover_and_load, load_config},
    qgis_plugins_installer::{discover::default_archive_dir, resolve_target_root},
    tracing::debug,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(
    name = "qgis-plugins",
    version,
    about = "Install QGIS plugins into the user's QGIS profile"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file to use instead of the discovered `qgis-plugins.toml`.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Host serving `plugins/<name>.zip` (overrides config value).
    #[arg(long, global = true, env = "QGIS_PLUGINS_BASE_URL")]
    base_url: Option<String>,

    /// QGIS plugins directory to install into (overrides the OS default).
    #[arg(long, global = true, env = "QGIS_PLUGINS_DIR")]
    target_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Download and install the configured plugins (default).
    Install,
    /// Install every `*.zip` found in a local directory.
    InstallLocal {
        /// Directory holding plugin archives (default: `plugins/` next to
        /// the executable, else `./plugins`).
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Print the resolved QGIS plugins directory.
    Paths,
    /// Generate `plugins.xml`, `index.html` and icons for a plugin
    /// repository.
    Index {
        /// Directory holding the published plugin archives.
        #[arg(long, default_value = "plugins")]
        archives: PathBuf,
        /// Where the site is written.
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },
}

/// Logs go to stderr so stdout carries only the install report.
fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

/// Config file (explicit or discovered) with CLI overrides applied.
fn resolve_config(cli: &Cli) -> anyhow::Result<InstallerConfig> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => discover_and_load(),
    };
    if let Some(base_url) = &cli.base_url {
        config.base_url = base_url.clone();
    }
    if let Some(dir) = &cli.target_dir {
        config.plugins_dir = Some(dir.clone());
    }
    Ok(config)
}

async fn run(cli: Cli) -> anyhow::Result<u8> {
    let config = resolve_config(&cli)?;
    debug!(base_url = %config.base_url, plugins = config.plugins.len(), "resolved config");

    match cli.command {
        None | Some(Commands::Install) => install_commands::handle_install(&config).await,
        Some(Commands::InstallLocal { dir }) => {
            install_commands::handle_install_local(&config, dir).await
        },
        Some(Commands::Paths) => {
            println!("QGIS plugins directory: {}", resolve_target_root(&config)?.display());
            println!("Local archive directory: {}", default_archive_dir().display());
            if let Some(dir) = qgis_plugins_config::config_dir() {
                println!("Config directory:        {}", dir.display());
            }
            Ok(0)
        },
        Some(Commands::Index {
            archives,
            output_dir,
        }) => {
            index_commands::handle_index(&config, &archives, &output_dir)?;
            Ok(0)
        },
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_telemetry(&cli);
    debug!(version = env!("CARGO_PKG_VERSION"), "qgis-plugins starting");

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        },
    }
}
