//! `hydrodash`: terminal dashboard for HydroControl GE hubs.
//!
//! Polls the hub's node list, shows every reservoir and well it knows
//! about, and lets the operator rename nodes and assign wells to
//! reservoirs. Logs go to a file (default `/tmp/hydrodash.log`) so they
//! never corrupt the terminal.

mod action;
mod app;
mod component;
mod data_bridge;
mod event;
mod screens;
mod theme;
mod tui;
mod widgets;

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

use hydro_core::{Dashboard, DashboardConfig};

use crate::app::App;

/// Terminal dashboard for HydroControl GE reservoir and well hubs.
#[derive(Parser, Debug)]
#[command(name = "hydrodash", version, about)]
struct Cli {
    /// Hub URL (e.g., http://192.168.4.1)
    #[arg(short = 'u', long, env = "HYDRO_HUB_URL")]
    hub: Option<String>,

    /// Config profile to use
    #[arg(short = 'p', long, env = "HYDRO_PROFILE")]
    profile: Option<String>,

    /// Status refresh period (e.g., 2s, 500ms)
    #[arg(long)]
    interval: Option<String>,

    /// Also listen to the hub's push-update stream
    #[arg(long)]
    push: bool,

    /// Log file path
    #[arg(long, default_value = "/tmp/hydrodash.log")]
    log_file: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// File-based tracing. Nothing may be written to stdout/stderr while the
/// terminal is in raw mode. Hold the guard until exit so logs flush.
fn setup_tracing(cli: &Cli) -> WorkerGuard {
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "hydrodash={log_level},hydro_core={log_level},hydro_api={log_level}"
        ))
    });

    let log_dir = cli
        .log_file
        .parent()
        .unwrap_or(std::path::Path::new("/tmp"));
    let log_filename = cli
        .log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("hydrodash.log"));

    let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true),
        )
        .init();

    guard
}

/// Priority: CLI flags > config file profile > built-in defaults.
fn build_config(cli: &Cli) -> Result<DashboardConfig> {
    let file = hydro_config::load_config().unwrap_or_else(|e| {
        warn!(error = %e, "config file unreadable, using defaults");
        hydro_config::Config::default()
    });

    let (name, profile) = file.profile(cli.profile.as_deref())?;
    let mut config = hydro_config::profile_to_dashboard_config(&profile, &name, &file.defaults)?;

    if let Some(hub) = &cli.hub {
        config.url = Url::parse(hub).wrap_err_with(|| format!("invalid hub URL: {hub}"))?;
    }
    if let Some(interval) = &cli.interval {
        config.refresh_interval = hydro_config::parse_duration("--interval", interval)?;
    }
    if cli.push {
        config.push_updates = true;
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tui::install_hooks()?;
    let _log_guard = setup_tracing(&cli);

    let config = build_config(&cli)?;
    info!(
        hub = %config.url,
        period = %humantime::format_duration(config.refresh_interval),
        push = config.push_updates,
        "starting hydrodash"
    );

    let dashboard = Dashboard::from_config(config)?;
    let mut app = App::new(dashboard);
    app.run().await?;

    Ok(())
}
