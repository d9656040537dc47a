// Main entrypoint for powerrelay: a wake/shutdown relay for an always-on device.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use powerrelay::app::{ListenerApp, PollerApp, RelayApp};
use powerrelay::config::{Config, ConfigTrait};
use powerrelay::shutdown::GracefulShutdown;
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

const CONFIG_PATH: &str = "cfg/powerrelay.cfg.yaml";
const CONFIG_PATH_LOCAL: &str = "cfg/powerrelay.cfg.local.yaml";

const GRACEFUL_TIMEOUT: Duration = Duration::from_secs(15);

/// powerrelay - queue wake/shutdown requests for a polling device and act on them
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Custom config file path
    #[arg(short, long, value_name = "FILE", global = true)]
    cfg: Option<PathBuf>,

    #[command(subcommand)]
    role: Role,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Role {
    /// Public relay holding the request queue
    Relay,
    /// Command receiver on the target host, runs the shutdown command
    Listener,
    /// Device loop: polls the relay, sends Wake-on-LAN and shutdown commands
    Poller,
}

impl Role {
    fn as_str(&self) -> &'static str {
        match self {
            Role::Relay => "relay",
            Role::Listener => "listener",
            Role::Poller => "poller",
        }
    }
}

/// Where the configuration came from. Logged once the logger is up.
enum CfgSource {
    File(PathBuf),
    Defaults,
}

/// Loads the configuration struct from YAML file.
/// Tries local config first, then the default config, then built-in defaults.
fn load_cfg(path: Option<PathBuf>) -> Result<(Config, CfgSource)> {
    if let Some(custom_path) = path {
        let cfg = Config::load(&custom_path)
            .with_context(|| format!("failed to load custom config from {:?}", custom_path))?;
        return Ok((cfg, CfgSource::File(custom_path)));
    }

    for candidate in [CONFIG_PATH_LOCAL, CONFIG_PATH] {
        let candidate = PathBuf::from(candidate);
        if !candidate.exists() {
            continue;
        }
        let cfg = Config::load(&candidate)
            .with_context(|| format!("failed to load config from {:?}", candidate))?;
        return Ok((cfg, CfgSource::File(candidate)));
    }

    Ok((Config::default(), CfgSource::Defaults))
}

/// Configures structured logging based on configuration.
fn configure_logger(cfg: &Config) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let log_level = cfg
        .logs()
        .and_then(|logs| logs.level.as_ref())
        .map(|s| s.as_str())
        .unwrap_or("info");

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    if cfg.is_prod() {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().pretty())
            .init();
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // The recorder must be installed before the runtime starts.
    if let Err(e) = powerrelay::controller::init_prometheus_exporter() {
        eprintln!("Warning: Failed to initialize Prometheus metrics exporter: {}", e);
        eprintln!("Metrics endpoint will not be available");
    }

    tokio::runtime::Runtime::new()
        .context("Failed to create tokio runtime")?
        .block_on(async_main(args))
}

async fn async_main(args: Args) -> Result<()> {
    let shutdown_token = CancellationToken::new();

    let (cfg, source) = load_cfg(args.cfg)?;
    configure_logger(&cfg);

    match &source {
        CfgSource::File(path) => info!(
            component = "config",
            event = "load_success",
            path = ?path,
            "config loaded"
        ),
        CfgSource::Defaults => warn!(
            component = "config",
            event = "defaults",
            "no config file found, using built-in defaults"
        ),
    }

    let graceful_shutdown = GracefulShutdown::new(shutdown_token.clone());
    graceful_shutdown.set_graceful_timeout(GRACEFUL_TIMEOUT);

    info!(
        component = "main",
        event = "starting",
        role = args.role.as_str(),
        env = %cfg.env,
        "starting powerrelay"
    );

    // Bind failures and invalid settings end the process before any signal wait.
    match args.role {
        Role::Relay => {
            RelayApp::new(shutdown_token.clone(), &cfg)?
                .serve(&graceful_shutdown)
                .await?;
        }
        Role::Listener => {
            ListenerApp::new(shutdown_token.clone(), &cfg)?
                .serve(&graceful_shutdown)
                .await?;
        }
        Role::Poller => {
            PollerApp::new(shutdown_token.clone(), &cfg)?.serve(&graceful_shutdown);
        }
    }

    if let Err(e) = graceful_shutdown.await_shutdown().await {
        error!(
            component = "main",
            scope = "service",
            event = "graceful_shutdown_failed",
            error = %e,
            "failed to gracefully shut down service"
        );
        return Err(e);
    }

    Ok(())
}
