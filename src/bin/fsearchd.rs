//! fsearch daemon - networked file search server
//!
//! Clients connect over TCP (telnet works), send `<depth> <mask>` lines and
//! receive every regular file under the search root, at most `depth` levels
//! down, whose name contains `mask`.
//!
//! # Usage
//!
//! ```bash
//! # Serve /srv/files on port 7070
//! fsearchd 7070 /srv/files
//!
//! # Only listen on loopback
//! fsearchd 7070 /srv/files --bind 127.0.0.1
//!
//! # Settings from a file, port overridden from the environment
//! FSEARCH_PORT=8080 fsearchd --config /etc/fsearchd.toml
//!
//! # Enable debug logging
//! RUST_LOG=fsearchd=debug fsearchd 7070 /srv/files
//! ```
//!
//! # Signal Handling
//!
//! - SIGTERM/SIGINT: Graceful shutdown

use std::net::IpAddr;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use fsearchd::config::{PartialConfig, ServerConfig};
use fsearchd::service::SearchService;

/// fsearch daemon - streams matching file paths to TCP clients
#[derive(Parser, Debug)]
#[command(name = "fsearchd", version, about)]
struct Args {
    /// Port to listen on
    port: Option<u16>,

    /// Directory every search starts from
    root: Option<PathBuf>,

    /// Address to listen on (default 0.0.0.0)
    #[arg(long)]
    bind: Option<IpAddr>,

    /// TOML file with `bind`, `port` and `root`
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl Args {
    fn layer(&self) -> PartialConfig {
        PartialConfig {
            bind: self.bind,
            port: self.port,
            root: self.root.clone(),
        }
    }
}

/// Builds the configuration: file, then environment, then command line.
fn load_config(args: &Args) -> Result<ServerConfig> {
    let file = match &args.config {
        Some(path) => PartialConfig::from_file(path)?,
        None => PartialConfig::default(),
    };
    let env = PartialConfig::from_env()?;

    file.merge(env)
        .merge(args.layer())
        .resolve()
        .context("Usage: fsearchd <port> <root> (or set FSEARCH_PORT/FSEARCH_ROOT)")
}

/// Log filter used when `RUST_LOG` is unset or unparsable
const DEFAULT_LOG_FILTER: &str = "fsearchd=info,fsearch_core=info";

/// Builds the log filter from `RUST_LOG`, falling back to the defaults.
fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    run_server(config)
}

/// Runs the server (async entry point).
#[tokio::main]
async fn run_server(config: ServerConfig) -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        pid = process::id(),
        "fsearch daemon starting"
    );

    // Create cancellation token for graceful shutdown
    let cancel_token = CancellationToken::new();

    // Setup signal handlers
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        if let Err(e) = wait_for_shutdown_signal().await {
            error!(error = %e, "Error waiting for shutdown signal");
        }
        info!("Shutdown signal received");
        shutdown_token.cancel();
    });

    let service = match SearchService::bind(&config, cancel_token).await {
        Ok(service) => service,
        Err(e) => {
            error!(error = %e, "Failed to start search service");
            return Err(e.into());
        }
    };

    info!(
        addr = %service.local_addr()?,
        root = %config.root.display(),
        "Serving searches"
    );

    let stats = service.run().await.context("Search service failed")?;

    info!(
        completed = stats.completed,
        failed = stats.failed,
        "fsearch daemon stopped"
    );
    Ok(())
}

/// Waits for a shutdown signal (SIGTERM or SIGINT).
async fn wait_for_shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        info!("Received Ctrl+C");
    }

    Ok(())
}
