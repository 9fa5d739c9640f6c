//! inkdash web control panel entry point.
//!
//! Serves the REST API that edits the shared YAML configuration.  The display
//! service picks up every change on its next refresh cycle.
//!
//! # Usage
//!
//! ```text
//! inkdash-web [OPTIONS]
//!
//! Options:
//!   --config <PATH>  Configuration file [env: INKDASH_CONFIG] [default: config/config.yaml]
//!   --bind <ADDR>    Address to listen on [env: INKDASH_WEB_BIND] [default: 0.0.0.0]
//!   --port <PORT>    Port to listen on [env: INKDASH_WEB_PORT] [default: 5000]
//! ```
//!
//! There is no authentication: bind to `127.0.0.1` unless every device on the
//! local network may change the dashboard.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use inkdash_core::ConfigStore;
use inkdash_web::application::ConfigService;
use inkdash_web::infrastructure::{run_server, NominatimGeocoder};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Web control panel for the inkdash e-paper dashboard.
#[derive(Debug, Parser)]
#[command(name = "inkdash-web", about = "REST control panel for the inkdash configuration", version)]
struct Cli {
    /// Path to the YAML configuration file shared with the display service.
    #[arg(long, default_value = "config/config.yaml", env = "INKDASH_CONFIG")]
    config: PathBuf,

    /// IP address to bind the HTTP server to.
    ///
    /// `0.0.0.0` accepts connections from the whole LAN, `127.0.0.1` only
    /// from the Pi itself.
    #[arg(long, default_value = "0.0.0.0", env = "INKDASH_WEB_BIND")]
    bind: String,

    /// TCP port of the HTTP server.
    #[arg(long, default_value_t = 5000, env = "INKDASH_WEB_PORT")]
    port: u16,
}

impl Cli {
    /// # Errors
    ///
    /// Returns an error if `--bind` is not an IP address.
    fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        let ip: IpAddr = self
            .bind
            .parse()
            .with_context(|| format!("invalid bind address: '{}'", self.bind))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Resolves when Ctrl+C or (on Unix) SIGTERM is received.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
                return;
            }
            Err(e) => error!("failed to listen for SIGTERM: {e}"),
        }
    }
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for Ctrl+C signal: {e}");
        std::future::pending::<()>().await;
    }
}

/// Resolves once `running` has been cleared.
async fn stopped(running: Arc<AtomicBool>) {
    while running.load(Ordering::Relaxed) {
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let addr = cli.bind_addr()?;

    let store = ConfigStore::new(&cli.config);
    // Fail at start-up rather than on the first request.
    store
        .load()
        .await
        .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;

    let geocoder = NominatimGeocoder::new().context("failed to create HTTP client")?;
    let service = Arc::new(ConfigService::new(store, Arc::new(geocoder)));
    info!("inkdash web panel starting: config {}", cli.config.display());

    // ── Graceful shutdown flag ─────────────────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("shutdown signal received");
        running_clone.store(false, Ordering::Relaxed);
    });

    run_server(addr, service, stopped(running)).await?;

    info!("inkdash web panel stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
