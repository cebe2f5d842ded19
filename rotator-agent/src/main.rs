//! # site-rotator
//!
//! Unattended dashboard rotation for wall displays.
//!
//! The agent reads a dashboard list from a configuration URL, cycles through
//! it on a timer, scrolls long pages, retries and skips broken ones, and picks
//! up list changes without a restart. Operators can steer the rotation from
//! stdin while it runs.

mod console;
mod probe;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args as ClapArgs, Parser, Subcommand};
use rotator_config::{Config, ConfigLoad, ConfigLoader, ConfigWarnings};
use rotator_core::{
    ConfigSource, FilePositionStore, RotationRuntime, config_source_for,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::probe::HttpProbeSurface;

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "site-rotator")]
#[command(
    about = "Rotate a wall display through a remotely configured list of dashboards"
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    config: ConfigArgs,
}

#[derive(ClapArgs, Debug, Clone)]
struct ConfigArgs {
    /// Path to rotator.toml (defaults to ./rotator.toml or
    /// ./config/rotator.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Path to a .env file seeding ROTATOR_* variables
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    /// Location of the dashboard list (overrides ROTATOR_CONFIG_URL and the
    /// file)
    #[arg(long, global = true)]
    config_url: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Rotate through the dashboards until interrupted (default)
    Run,
    /// Fetch the dashboard list once, print it, and exit
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => run(config).await,
        Command::Check => check(config).await,
    }
}

fn load_config(args: &ConfigArgs) -> anyhow::Result<Config> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = &args.config {
        loader = loader.with_config_path(path);
    }
    if let Some(path) = &args.env_file {
        loader = loader.with_env_file(path);
    }
    if let Some(url) = &args.config_url {
        loader = loader.with_source_url(url);
    }

    let ConfigLoad { config, warnings } =
        loader.load().context("failed to load configuration")?;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| {
            "info,rotator_core=info,reqwest=warn,hyper=warn".into()
        });
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    if config.metadata.env_file_loaded {
        info!("loaded .env file");
    }
    if let Some(path) = &config.metadata.config_path {
        info!(path = %path.display(), "configuration file loaded");
    }
    log_warnings(&warnings);

    Ok(config)
}

fn log_warnings(warnings: &ConfigWarnings) {
    for warning in &warnings.items {
        match &warning.hint {
            Some(hint) => warn!(
                message = %warning.message,
                hint = %hint,
                "configuration warning"
            ),
            None => warn!(message = %warning.message, "configuration warning"),
        }
    }
}

async fn run(config: Config) -> anyhow::Result<()> {
    let settings = config.rotation_settings();
    let dwell = humantime::format_duration(settings.default_dwell);
    let refresh = humantime::format_duration(settings.refresh_interval);
    info!(
        source = %config.source.url,
        rotation.default_dwell = %dwell,
        rotation.refresh_interval = %refresh,
        rotation.retry_limit = settings.retry_limit,
        "starting rotation"
    );

    let source = build_source(&config)?;
    let surface =
        HttpProbeSurface::new(config.probe.metrics(), settings.load_timeout)
            .context("failed to build HTTP client for the probe surface")?;

    let mut runtime = RotationRuntime::new(settings, source, Arc::new(surface));
    if let Some(path) = &config.state.position_file {
        info!(path = %path.display(), "persisting rotation position");
        let store = FilePositionStore::new(path);
        runtime = runtime.with_position_store(Arc::new(store));
    }
    let handle = runtime.spawn();

    let shutdown = handle.shutdown_token();
    let transitions = tokio::spawn(console::log_transitions(
        handle.subscribe(),
        shutdown.clone(),
    ));

    let outcome = tokio::select! {
        result = console::run(&handle) => {
            info!("quit requested");
            result
        }
        signal = tokio::signal::ctrl_c() => {
            info!("interrupt received");
            signal.context("failed to listen for Ctrl-C")
        }
        _ = shutdown.cancelled() => {
            warn!("rotation runtime exited");
            Ok(())
        }
    };

    handle.shutdown().await;
    let _ = transitions.await;
    outcome
}

async fn check(config: Config) -> anyhow::Result<()> {
    let source = build_source(&config)?;
    let dashboards = source.refresh().await.with_context(|| {
        format!("could not read dashboards from {}", config.source.url)
    })?;

    println!("{} dashboards from {}", dashboards.len(), config.source.url);
    print!("{}", console::render_rows(&dashboards, None));
    Ok(())
}

fn build_source(config: &Config) -> anyhow::Result<Arc<dyn ConfigSource>> {
    config_source_for(&config.source.url, config.source.request_timeout)
        .context("failed to build configuration source")
}
