//! In-memory data sources for tests.
//!
//! The real sources talk to public HTTP APIs and read `/proc`; these doubles
//! return canned data and record what they were asked for, so widget and
//! dashboard tests run offline and can assert on the requests made.
//!
//! Every mock has a `should_fail` flag.  It is an `AtomicBool` rather than a
//! plain `bool` because tests usually hold the mock in an `Arc` shared with the
//! widget and flip the flag between updates.
//!
//! ```ignore
//! let weather = Arc::new(MockWeatherSource::new(sample_report()));
//! let mut widget = WeatherWidget::new(&config, weather.clone(), cache);
//! widget.update().await.unwrap();
//! weather.should_fail.store(true, Ordering::Relaxed);
//! assert!(widget.update().await.is_err());
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::{
    AssetKind, CounterSource, InterfaceCounters, Quote, QuoteSource, SourceError, WeatherQuery,
    WeatherReport, WeatherSource,
};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

fn mock_failure() -> SourceError {
    SourceError::BadResponse("mock failure".to_string())
}

// ── Weather ───────────────────────────────────────────────────────────────────

/// Returns a fixed [`WeatherReport`] and records every query.
pub struct MockWeatherSource {
    pub report: Mutex<WeatherReport>,
    /// Every query received, in order.
    pub queries: Mutex<Vec<WeatherQuery>>,
    pub should_fail: AtomicBool,
}

impl MockWeatherSource {
    pub fn new(report: WeatherReport) -> Self {
        Self {
            report: Mutex::new(report),
            queries: Mutex::new(Vec::new()),
            should_fail: AtomicBool::new(false),
        }
    }

    pub fn call_count(&self) -> usize {
        lock(&self.queries).len()
    }
}

#[async_trait]
impl WeatherSource for MockWeatherSource {
    async fn forecast(&self, query: &WeatherQuery) -> Result<WeatherReport, SourceError> {
        lock(&self.queries).push(query.clone());
        if self.should_fail.load(Ordering::Relaxed) {
            return Err(mock_failure());
        }
        Ok(lock(&self.report).clone())
    }
}

// ── Quotes ────────────────────────────────────────────────────────────────────

/// Serves quotes from a map; unknown symbols answer `Ok(None)`.
#[derive(Default)]
pub struct MockQuoteSource {
    pub quotes: Mutex<HashMap<String, Quote>>,
    /// Symbols whose lookup returns an error even when `should_fail` is off.
    pub failing: Mutex<HashSet<String>>,
    /// Every symbol requested, in order.
    pub requests: Mutex<Vec<String>>,
    pub should_fail: AtomicBool,
}

impl MockQuoteSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the quote for `symbol`.
    pub fn set_quote(&self, symbol: &str, price: f64, change_pct: f64, kind: AssetKind) {
        lock(&self.quotes).insert(
            symbol.to_string(),
            Quote {
                symbol: symbol.to_string(),
                price,
                change_pct,
                kind,
            },
        );
    }

    pub fn fail_symbol(&self, symbol: &str) {
        lock(&self.failing).insert(symbol.to_string());
    }

    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }
}

#[async_trait]
impl QuoteSource for MockQuoteSource {
    async fn quote(&self, symbol: &str) -> Result<Option<Quote>, SourceError> {
        lock(&self.requests).push(symbol.to_string());
        if self.should_fail.load(Ordering::Relaxed) || lock(&self.failing).contains(symbol) {
            return Err(mock_failure());
        }
        Ok(lock(&self.quotes).get(symbol).cloned())
    }
}

// ── Network counters ──────────────────────────────────────────────────────────

/// Serves interface counters that tests advance by hand.
#[derive(Default)]
pub struct MockCounterSource {
    pub interfaces: Mutex<Vec<InterfaceCounters>>,
    pub connections: AtomicUsize,
    pub should_fail: AtomicBool,
}

impl MockCounterSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the cumulative counters of `name`, adding the interface if needed.
    pub fn set_counters(&self, name: &str, rx_bytes: u64, tx_bytes: u64) {
        let mut ifaces = lock(&self.interfaces);
        match ifaces.iter_mut().find(|i| i.name == name) {
            Some(iface) => {
                iface.rx_bytes = rx_bytes;
                iface.tx_bytes = tx_bytes;
            }
            None => ifaces.push(InterfaceCounters {
                name: name.to_string(),
                rx_bytes,
                tx_bytes,
            }),
        }
    }
}

impl CounterSource for MockCounterSource {
    fn interfaces(&self) -> Result<Vec<InterfaceCounters>, SourceError> {
        if self.should_fail.load(Ordering::Relaxed) {
            return Err(mock_failure());
        }
        Ok(lock(&self.interfaces).clone())
    }

    fn connection_count(&self) -> Result<usize, SourceError> {
        if self.should_fail.load(Ordering::Relaxed) {
            return Err(mock_failure());
        }
        Ok(self.connections.load(Ordering::Relaxed))
    }
}
