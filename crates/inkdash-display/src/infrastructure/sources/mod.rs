//! Data sources behind the widgets.
//!
//! Each source is a trait so widgets can be tested without the network or a
//! Linux `/proc` file system:
//!
//! | Trait             | Production implementation | Data                         |
//! |-------------------|---------------------------|------------------------------|
//! | [`WeatherSource`] | [`open_meteo::OpenMeteoSource`] | current conditions + daily forecast |
//! | [`QuoteSource`]   | [`quotes::HttpQuoteSource`]     | crypto (CoinGecko) and stock (Finnhub) quotes |
//! | [`CounterSource`] | [`proc_net::ProcNetSource`]     | interface byte counters, socket count |
//!
//! Test doubles for all three live in [`mock`] and are always compiled so
//! integration tests can use them too.

pub mod mock;
pub mod open_meteo;
pub mod proc_net;
pub mod quotes;

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use inkdash_core::TemperatureUnit;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Timeout applied to every outbound HTTP request.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// User-Agent sent with every outbound HTTP request.
pub const USER_AGENT: &str = concat!("inkdash/", env!("CARGO_PKG_VERSION"));

/// Errors raised by data sources.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Transport failure, timeout, non-2xx status, or undecodable body.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The response decoded but did not contain what we need.
    #[error("unexpected response: {0}")]
    BadResponse(String),

    /// A local counter file could not be read.
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Builds the shared HTTP client.
///
/// # Errors
///
/// Returns [`SourceError::Http`] if the TLS backend cannot be initialised.
pub fn http_client() -> Result<reqwest::Client, SourceError> {
    Ok(reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()?)
}

// ── Weather ───────────────────────────────────────────────────────────────────

/// What to ask the weather service for.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherQuery {
    pub latitude: f64,
    pub longitude: f64,
    pub units: TemperatureUnit,
    /// Number of forecast days including today.
    pub days: u32,
}

/// Current conditions plus a daily forecast, today first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub current_temp: f64,
    pub current_code: u16,
    pub daily: Vec<DailyForecast>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub high: f64,
    pub low: f64,
    pub code: u16,
}

#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Fetches current conditions and the daily forecast.
    async fn forecast(&self, query: &WeatherQuery) -> Result<WeatherReport, SourceError>;
}

// ── Quotes ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Crypto,
    Stock,
}

/// A price with its 24-hour / daily change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub price: f64,
    pub change_pct: f64,
    pub kind: AssetKind,
}

#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Fetches a quote for `symbol`.
    ///
    /// Returns `Ok(None)` when the provider has no data for the symbol (an
    /// unknown coin, a zero stock price, or no API key configured).
    async fn quote(&self, symbol: &str) -> Result<Option<Quote>, SourceError>;
}

// ── Network counters ──────────────────────────────────────────────────────────

/// Cumulative byte counters of one network interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceCounters {
    pub name: String,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

impl InterfaceCounters {
    pub fn total(&self) -> u64 {
        self.rx_bytes.saturating_add(self.tx_bytes)
    }
}

pub trait CounterSource: Send + Sync {
    /// Byte counters for every interface, loopback included.
    fn interfaces(&self) -> Result<Vec<InterfaceCounters>, SourceError>;

    /// Number of open TCP and UDP sockets (IPv4 and IPv6).
    fn connection_count(&self) -> Result<usize, SourceError>;
}
