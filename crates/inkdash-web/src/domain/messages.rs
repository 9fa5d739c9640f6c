//! Request and response bodies of the REST API.
//!
//! Request bodies are loose: every field is optional and list
//! fields are kept as raw JSON values.  The browser sees a short message such
//! as `"Missing symbols"` or `"symbols must be a list"` instead of a serde
//! error, and the conversion methods below are where those messages come from.
//!
//! ```json
//! POST /api/portfolio/symbols   {"symbols": ["AAPL", "btc-usd"]}
//! 200                           {"success": true, "symbols": ["AAPL", "BTC-USD"]}
//! 400                           {"error": "symbols must be a list"}
//! ```

use inkdash_core::Holding;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A request body that is well-formed JSON but unusable.
///
/// The `Display` text is returned to the browser as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// A required field is absent (or `null`).
    #[error("Missing {0}")]
    MissingField(&'static str),

    /// A field that must be a JSON array is something else.
    #[error("{0} must be a list")]
    NotAList(&'static str),

    /// A symbol list entry is not a string.
    #[error("Invalid symbol")]
    InvalidSymbol,

    #[error("Each holding must have a symbol")]
    HoldingWithoutSymbol,

    /// A holding entry has a field of the wrong type.
    #[error("Invalid holding")]
    InvalidHolding,
}

// ── Requests ──────────────────────────────────────────────────────────────────

/// `POST /api/weather/location`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocationRequest {
    #[serde(default)]
    pub zip_code: Option<String>,
}

impl LocationRequest {
    pub fn zip_code(&self) -> Result<&str, RequestError> {
        self.zip_code
            .as_deref()
            .ok_or(RequestError::MissingField("zip_code"))
    }
}

/// `POST /api/portfolio/symbols`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SymbolsRequest {
    #[serde(default)]
    pub symbols: Option<Value>,
}

impl SymbolsRequest {
    /// Extracts the raw symbol strings; normalization happens in the config.
    pub fn into_symbols(self) -> Result<Vec<String>, RequestError> {
        let value = self.symbols.ok_or(RequestError::MissingField("symbols"))?;
        let Value::Array(items) = value else {
            return Err(RequestError::NotAList("symbols"));
        };
        items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok(s),
                _ => Err(RequestError::InvalidSymbol),
            })
            .collect()
    }
}

/// `POST /api/portfolio/symbol`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SymbolRequest {
    #[serde(default)]
    pub symbol: Option<String>,
}

impl SymbolRequest {
    pub fn symbol(&self) -> Result<&str, RequestError> {
        self.symbol.as_deref().ok_or(RequestError::MissingField("symbol"))
    }
}

/// `POST /api/portfolio/holding`, and each entry of `POST /api/portfolio/holdings`.
///
/// Missing share counts and cost bases default to zero.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HoldingRequest {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub shares: Option<f64>,
    #[serde(default)]
    pub cost_basis: Option<f64>,
}

impl HoldingRequest {
    /// `None` when the symbol is missing.
    pub fn into_holding(self) -> Option<Holding> {
        Some(Holding {
            symbol: self.symbol?,
            shares: self.shares.unwrap_or(0.0),
            cost_basis: self.cost_basis.unwrap_or(0.0),
        })
    }
}

/// `POST /api/portfolio/holdings`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HoldingsRequest {
    #[serde(default)]
    pub holdings: Option<Value>,
}

impl HoldingsRequest {
    pub fn into_holdings(self) -> Result<Vec<Holding>, RequestError> {
        let value = self.holdings.ok_or(RequestError::MissingField("holdings"))?;
        let Value::Array(items) = value else {
            return Err(RequestError::NotAList("holdings"));
        };
        items
            .into_iter()
            .map(|item| {
                let request: HoldingRequest =
                    serde_json::from_value(item).map_err(|_| RequestError::InvalidHolding)?;
                request.into_holding().ok_or(RequestError::HoldingWithoutSymbol)
            })
            .collect()
    }
}

// ── Responses ─────────────────────────────────────────────────────────────────

/// Body of every 4xx/5xx response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// `{"success": true}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationResponse {
    pub success: bool,
    /// City name shown on the weather widget.
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Symbol list.  `success` is present only on responses to writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolsResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    pub symbols: Vec<String>,
}

impl SymbolsResponse {
    pub fn list(symbols: Vec<String>) -> Self {
        Self {
            success: None,
            symbols,
        }
    }

    pub fn updated(symbols: Vec<String>) -> Self {
        Self {
            success: Some(true),
            symbols,
        }
    }
}

/// Holding list.  `success` is present only on responses to writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingsResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    pub holdings: Vec<Holding>,
}

impl HoldingsResponse {
    pub fn list(holdings: Vec<Holding>) -> Self {
        Self {
            success: None,
            holdings,
        }
    }

    pub fn updated(holdings: Vec<Holding>) -> Self {
        Self {
            success: Some(true),
            holdings,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
