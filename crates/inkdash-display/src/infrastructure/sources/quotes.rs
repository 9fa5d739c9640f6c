//! Crypto and stock quotes.
//!
//! Crypto symbols (`BTC`, `ETH-USD`, …) are priced through CoinGecko's free
//! `simple/price` endpoint; everything else is treated as a stock and priced
//! through Finnhub, which needs an API key.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{http_client, AssetKind, Quote, QuoteSource, SourceError};

const COINGECKO_URL: &str = "https://api.coingecko.com/api/v3/simple/price";
const FINNHUB_URL: &str = "https://finnhub.io/api/v1/quote";

/// Bases always treated as crypto, with or without a `-USD` suffix.
const CRYPTO_BASES: [&str; 10] = ["BTC", "ETH", "USDT", "BNB", "SOL", "ADA", "DOGE", "XRP", "DOT", "MATIC"];

/// `true` for symbols priced through CoinGecko.
pub fn is_crypto_symbol(symbol: &str) -> bool {
    let upper = symbol.to_uppercase();
    let base = upper.split('-').next().unwrap_or_default();
    CRYPTO_BASES.contains(&base) || upper.contains("-USD")
}

/// CoinGecko coin id for a ticker base, e.g. `BTC` → `bitcoin`.
pub fn coingecko_id(base: &str) -> Option<&'static str> {
    let id = match base.to_uppercase().as_str() {
        "BTC" => "bitcoin",
        "ETH" => "ethereum",
        "USDT" => "tether",
        "BNB" => "binancecoin",
        "SOL" => "solana",
        "ADA" => "cardano",
        "DOGE" => "dogecoin",
        "XRP" => "ripple",
        "DOT" => "polkadot",
        "MATIC" => "matic-network",
        "AVAX" => "avalanche-2",
        "LINK" => "chainlink",
        "UNI" => "uniswap",
        "ATOM" => "cosmos",
        "LTC" => "litecoin",
        _ => return None,
    };
    Some(id)
}

#[derive(Debug, Deserialize)]
struct CoinPrice {
    usd: f64,
    #[serde(default)]
    usd_24h_change: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct FinnhubQuote {
    /// Current price; Finnhub answers `0` for unknown symbols.
    #[serde(default)]
    c: f64,
    /// Percent change since the previous close.
    #[serde(default)]
    dp: Option<f64>,
}

fn coin_quote(symbol: &str, id: &str, body: &HashMap<String, CoinPrice>) -> Option<Quote> {
    body.get(id).map(|p| Quote {
        symbol: symbol.to_string(),
        price: p.usd,
        change_pct: p.usd_24h_change.unwrap_or(0.0),
        kind: AssetKind::Crypto,
    })
}

fn stock_quote(symbol: &str, body: &FinnhubQuote) -> Option<Quote> {
    if body.c == 0.0 {
        return None;
    }
    Some(Quote {
        symbol: symbol.to_string(),
        price: body.c,
        change_pct: body.dp.unwrap_or(0.0),
        kind: AssetKind::Stock,
    })
}

/// [`QuoteSource`] backed by CoinGecko and Finnhub.
pub struct HttpQuoteSource {
    client: reqwest::Client,
    finnhub_api_key: String,
}

impl HttpQuoteSource {
    /// An empty `finnhub_api_key` disables stock quotes.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the HTTP client cannot be built.
    pub fn new(finnhub_api_key: impl Into<String>) -> Result<Self, SourceError> {
        Ok(Self {
            client: http_client()?,
            finnhub_api_key: finnhub_api_key.into(),
        })
    }

    async fn crypto(&self, symbol: &str) -> Result<Option<Quote>, SourceError> {
        let base = symbol.split('-').next().unwrap_or(symbol);
        let Some(id) = coingecko_id(base) else {
            debug!(symbol, "no CoinGecko id for symbol");
            return Ok(None);
        };
        let body: HashMap<String, CoinPrice> = self
            .client
            .get(COINGECKO_URL)
            .query(&[("ids", id), ("vs_currencies", "usd"), ("include_24hr_change", "true")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(coin_quote(symbol, id, &body))
    }

    async fn stock(&self, symbol: &str) -> Result<Option<Quote>, SourceError> {
        if self.finnhub_api_key.is_empty() {
            debug!(symbol, "no Finnhub API key configured");
            return Ok(None);
        }
        let body: FinnhubQuote = self
            .client
            .get(FINNHUB_URL)
            .query(&[("symbol", symbol), ("token", self.finnhub_api_key.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(stock_quote(symbol, &body))
    }
}

#[async_trait]
impl QuoteSource for HttpQuoteSource {
    async fn quote(&self, symbol: &str) -> Result<Option<Quote>, SourceError> {
        let symbol = symbol.to_uppercase();
        if is_crypto_symbol(&symbol) {
            self.crypto(&symbol).await
        } else {
            self.stock(&symbol).await
        }
    }
}
