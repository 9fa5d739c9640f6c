//! inkdash display service entry point.
//!
//! Loads the YAML configuration, wires the production data sources and the
//! selected panel backend into a [`Dashboard`], and runs the polling loop
//! until Ctrl+C or SIGTERM.
//!
//! # Usage
//!
//! ```text
//! inkdash [OPTIONS]
//!
//! Options:
//!   --config <PATH>  Configuration file [env: INKDASH_CONFIG] [default: config/config.yaml]
//!   --once           Draw one frame and exit
//!   --clear-cache    Delete cached API responses before starting
//! ```
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ read_config()              -- YAML → DashboardConfig
//!  └─ DefaultWidgetFactory       -- Open-Meteo, CoinGecko/Finnhub, /proc/net + ApiCache
//!  └─ DisplayDriver(build_panel) -- simulation (PBM) or raw buffer
//!  └─ Dashboard::run()           -- refresh every interval, clock ticks in between
//! ```

use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use inkdash_core::storage::config_store::read_config;
use inkdash_display::application::dashboard::Dashboard;
use inkdash_display::application::display::DisplayDriver;
use inkdash_display::infrastructure::api_cache::ApiCache;
use inkdash_display::infrastructure::panel::build_panel;
use inkdash_display::infrastructure::widgets::DefaultWidgetFactory;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// E-paper dashboard for the Raspberry Pi.
#[derive(Debug, Parser)]
#[command(name = "inkdash", about = "Clock, weather, portfolio and network dashboard for e-paper panels", version)]
struct Cli {
    /// Path to the YAML configuration file.
    ///
    /// A missing file is not an error: built-in defaults are used.
    #[arg(long, default_value = "config/config.yaml", env = "INKDASH_CONFIG")]
    config: PathBuf,

    /// Run a single refresh cycle, then put the panel to sleep and exit.
    #[arg(long)]
    once: bool,

    /// Delete cached API responses before the first refresh.
    #[arg(long)]
    clear_cache: bool,
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

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let config = read_config(&cli.config)
        .await
        .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;
    let (width, height) = config.display_size();
    info!(
        "inkdash starting: {}x{} {:?} display, refresh every {} min",
        width, height, config.display.backend, config.refresh.interval_minutes
    );

    let cache = Arc::new(ApiCache::new(&config.cache.dir));
    if cli.clear_cache {
        let removed = cache
            .clear_all()
            .await
            .with_context(|| format!("failed to clear cache at {}", cache.dir().display()))?;
        info!("removed {removed} cached responses");
    }

    let factory = DefaultWidgetFactory::production(Arc::clone(&cache)).context("failed to create HTTP client")?;
    let driver = DisplayDriver::new(build_panel(&config.display), width, height);
    let mut dashboard = Dashboard::new(config, Some(cli.config.clone()), Arc::new(factory), driver);

    if cli.once {
        dashboard.run_once().await.context("display update failed")?;
        info!("single update complete");
        return Ok(());
    }

    // ── Graceful shutdown flag ─────────────────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("shutdown signal received");
        running_clone.store(false, Ordering::Relaxed);
    });

    dashboard.run(running).await.context("display loop failed")?;

    info!("inkdash stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
