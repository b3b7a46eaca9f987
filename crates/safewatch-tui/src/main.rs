//! `safewatch-tui` — Real-time terminal dashboard for incident alert
//! monitoring.
//!
//! Built on [ratatui](https://ratatui.rs) with reactive data from
//! `safewatch-core`'s [`AlertStream`](safewatch_core::AlertStream).
//! Screens are navigable via number keys (1-3): Alerts, Assignments,
//! and Overview; pressing Enter on an alert opens its incident detail.
//!
//! Logs are written to a file (default `/tmp/safewatch-tui.log`) to
//! avoid corrupting the terminal UI. A background data bridge task
//! continuously streams alert, tourist, and status updates from the
//! sync engine into the TUI action loop.
//!
//! Entry point: CLI argument parsing, tracing setup, panic hooks, and
//! app launch.

mod action;
mod app;
mod component;
mod data_bridge;
mod event;
mod screen;
mod screens;
mod theme;
mod tui;
mod widgets;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::{Result, eyre};
use secrecy::SecretString;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use safewatch_core::{EngineConfig, Role, SyncEngine};

use crate::app::App;

/// Terminal dashboard for authority-facing incident alert monitoring.
#[derive(Parser, Debug)]
#[command(name = "safewatch-tui", version, about)]
struct Cli {
    /// Backend base URL (e.g., https://safewatch.example)
    #[arg(short = 'b', long, env = "SAFEWATCH_BACKEND")]
    backend: Option<String>,

    /// Operator identity, used as the default dispatch assignee
    #[arg(short = 'o', long, env = "SAFEWATCH_OPERATOR")]
    operator: Option<String>,

    /// Role: viewer, operator, dispatcher, or admin
    #[arg(short = 'r', long, default_value = "viewer", env = "SAFEWATCH_ROLE")]
    role: String,

    /// Bearer token for the backend
    #[arg(long, env = "SAFEWATCH_BEARER")]
    bearer: Option<String>,

    /// Config file path (defaults to the platform config dir)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Profile name from the config file
    #[arg(short = 'p', long)]
    profile: Option<String>,

    /// Log file path (defaults to /tmp/safewatch-tui.log)
    #[arg(long, default_value = "/tmp/safewatch-tui.log")]
    log_file: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Set up file-based tracing. We MUST NOT log to stdout/stderr — that
/// would corrupt the TUI output. Returns a guard that must be held for
/// the lifetime of the application to ensure logs are flushed.
fn setup_tracing(cli: &Cli) -> WorkerGuard {
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "safewatch_tui={log_level},safewatch_core={log_level}"
        ))
    });

    let log_dir = cli.log_file.parent().unwrap_or(std::path::Path::new("/tmp"));
    let log_filename = cli
        .log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("safewatch-tui.log"));

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

/// Build an [`EngineConfig`] from CLI args, if a backend URL was given.
fn config_from_cli(cli: &Cli) -> Result<Option<EngineConfig>> {
    let Some(backend) = cli.backend.as_deref() else {
        return Ok(None);
    };

    let base_url: url::Url = backend
        .parse()
        .map_err(|e| eyre!("invalid backend URL '{backend}': {e}"))?;
    let ws_url = EngineConfig::ws_url_for(&base_url)
        .map_err(|e| eyre!("cannot derive channel URL from '{backend}': {e}"))?;
    let role: Role = cli
        .role
        .parse()
        .map_err(|_| eyre!("unknown role '{}'", cli.role))?;

    Ok(Some(EngineConfig {
        base_url,
        ws_url,
        bearer: cli.bearer.clone().map(SecretString::from),
        operator_id: cli
            .operator
            .clone()
            .unwrap_or_else(|| "operator".to_owned()),
        role,
        timeout: Duration::from_secs(30),
        reconnect_initial_delay: Duration::from_secs(1),
        reconnect_max_delay: Duration::from_secs(30),
        reconnect_max_retries: None,
    }))
}

/// Build an [`EngineConfig`] from the config file.
fn config_from_file(cli: &Cli) -> Result<EngineConfig> {
    let config = match cli.config {
        Some(ref path) => safewatch_config::load_config_from(path)?,
        None => safewatch_config::load_config()?,
    };
    let (name, profile) = config.profile(cli.profile.as_deref())?;
    let engine_config =
        safewatch_config::profile_to_engine_config(profile, name, &config.defaults)?;
    Ok(engine_config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Install panic/error hooks BEFORE entering the terminal
    tui::install_hooks()?;

    // Tracing to file — hold the guard so logs flush on exit
    let _log_guard = setup_tracing(&cli);

    info!(
        backend = cli.backend.as_deref().unwrap_or("(from config)"),
        role = %cli.role,
        "starting safewatch-tui"
    );

    // Priority: CLI flags > config file
    let engine_config = match config_from_cli(&cli)? {
        Some(config) => config,
        None => config_from_file(&cli).map_err(|e| {
            eyre!("no backend configured: pass --backend or set up a config profile ({e})")
        })?,
    };

    let engine = SyncEngine::new(engine_config);
    let mut app = App::new(engine);
    app.run().await?;

    Ok(())
}
