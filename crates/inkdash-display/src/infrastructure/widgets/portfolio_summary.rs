//! Total value and daily change of the configured holdings.

use std::sync::Arc;

use async_trait::async_trait;
use inkdash_core::domain::config::PortfolioConfig;
use inkdash_core::domain::format::{format_daily_change, format_total_value};
use inkdash_core::{Bounds, Holding};
use tracing::{info, warn};

use super::source_failed;
use crate::application::canvas::{Anchor, Canvas, FontSize};
use crate::application::widget::{Widget, WidgetError};
use crate::infrastructure::api_cache::{ApiCache, SUMMARY_TTL};
use crate::infrastructure::sources::{Quote, QuoteSource, SourceError};

const NAME: &str = "portfolio_summary";

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PortfolioSummary {
    pub total_value: f64,
    pub total_cost: f64,
    pub daily_change: f64,
    pub daily_change_pct: f64,
}

/// Sums the holdings that have a quote.
///
/// Yesterday's price is recovered from the percentage change as
/// `price / (1 + pct / 100)`.  Holdings without a quote are left out of both
/// today's and yesterday's totals.
pub fn summarize(holdings: &[Holding], quotes: &[Quote]) -> PortfolioSummary {
    let mut summary = PortfolioSummary::default();
    let mut previous_total = 0.0;
    for holding in holdings {
        let Some(q) = quotes.iter().find(|q| q.symbol == holding.symbol) else {
            continue;
        };
        let previous_price = if q.change_pct != 0.0 {
            q.price / (1.0 + q.change_pct / 100.0)
        } else {
            q.price
        };
        summary.total_value += holding.shares * q.price;
        summary.total_cost += holding.shares * holding.cost_basis;
        previous_total += holding.shares * previous_price;
    }
    if previous_total > 0.0 {
        summary.daily_change = summary.total_value - previous_total;
        summary.daily_change_pct = summary.daily_change / previous_total * 100.0;
    }
    summary
}

async fn fetch_quotes(source: &dyn QuoteSource, symbols: &[String]) -> Result<Vec<Quote>, SourceError> {
    let mut quotes = Vec::new();
    let mut last_error = None;
    for symbol in symbols {
        match source.quote(symbol).await {
            Ok(Some(q)) => quotes.push(Quote {
                symbol: symbol.clone(),
                ..q
            }),
            Ok(None) => {}
            Err(e) => {
                warn!("quote for {symbol} failed: {e}");
                last_error = Some(e);
            }
        }
    }
    match last_error {
        Some(e) if quotes.is_empty() => Err(e),
        _ => Ok(quotes),
    }
}

pub struct PortfolioSummaryWidget {
    holdings: Vec<Holding>,
    source: Arc<dyn QuoteSource>,
    cache: Arc<ApiCache>,
    summary: Option<PortfolioSummary>,
}

impl PortfolioSummaryWidget {
    /// Only holdings with a symbol and a positive share count take part.
    pub fn new(config: &PortfolioConfig, source: Arc<dyn QuoteSource>, cache: Arc<ApiCache>) -> Self {
        let holdings = config
            .holdings
            .iter()
            .filter(|h| !h.symbol.is_empty() && h.shares > 0.0)
            .cloned()
            .collect();
        Self {
            holdings,
            source,
            cache,
            summary: None,
        }
    }

    pub fn summary(&self) -> Option<PortfolioSummary> {
        self.summary
    }

    /// Quotes are cached rather than the totals, so a changed share count
    /// shows up on the next refresh without waiting for the entry to expire.
    fn cache_key(symbols: &[String]) -> String {
        format!("portfolio_summary_{}", symbols.join("_"))
    }
}

#[async_trait]
impl Widget for PortfolioSummaryWidget {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn update(&mut self) -> Result<bool, WidgetError> {
        if self.holdings.is_empty() {
            return Ok(false);
        }
        let symbols: Vec<String> = self.holdings.iter().map(|h| h.symbol.clone()).collect();
        let key = Self::cache_key(&symbols);
        let source = Arc::clone(&self.source);
        let quotes = self
            .cache
            .get_or_fetch(&key, SUMMARY_TTL, move || async move {
                match fetch_quotes(source.as_ref(), &symbols).await {
                    Ok(quotes) if quotes.is_empty() => Err(WidgetError::NoData { widget: NAME }),
                    Ok(quotes) => Ok(quotes),
                    Err(e) => Err(source_failed(NAME)(e)),
                }
            })
            .await?;
        let summary = summarize(&self.holdings, &quotes);
        info!(
            "portfolio summary updated: {} ({})",
            format_total_value(summary.total_value),
            format_daily_change(summary.daily_change, summary.daily_change_pct)
        );
        self.summary = Some(summary);
        Ok(true)
    }

    fn render(&self, canvas: &mut Canvas<'_>, bounds: Bounds) {
        let cx = bounds.center_x();
        let cy = bounds.y + bounds.height as i32 / 2;
        canvas.draw_text("Portfolio", cx, bounds.y + 4, FontSize::Small, true, Anchor::TopCenter);

        if self.holdings.is_empty() {
            canvas.draw_text("No holdings", cx, cy, FontSize::Small, false, Anchor::Center);
            return;
        }
        let (value, change) = match &self.summary {
            Some(s) => (
                format_total_value(s.total_value),
                format_daily_change(s.daily_change, s.daily_change_pct),
            ),
            None => ("--".to_string(), String::new()),
        };
        canvas.draw_text(&value, cx, cy - 2, FontSize::Large, true, Anchor::Center);
        if !change.is_empty() {
            canvas.draw_text(&change, cx, cy + 14, FontSize::Tiny, false, Anchor::Center);
        }
    }
}
