//! Price list for the configured symbols, four rows per page.
//!
//! There is no touch input, so the widget turns to the next page on every
//! refresh once its first page has been shown.

use std::sync::Arc;

use async_trait::async_trait;
use inkdash_core::domain::config::PortfolioConfig;
use inkdash_core::domain::format::{format_change_pct, format_price};
use inkdash_core::Bounds;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::source_failed;
use crate::application::canvas::{Anchor, Canvas, FontSize, RectStyle};
use crate::application::widget::{Widget, WidgetError};
use crate::infrastructure::api_cache::{ApiCache, PORTFOLIO_TTL};
use crate::infrastructure::sources::{QuoteSource, SourceError};

const NAME: &str = "portfolio";

/// Rows shown per page.
pub const ITEMS_PER_PAGE: usize = 4;

/// One line of the list.  `price` is `None` when the symbol could not be
/// priced; the row then shows `--`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRow {
    pub symbol: String,
    pub price: Option<f64>,
    pub change_pct: Option<f64>,
}

impl QuoteRow {
    fn placeholder(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            price: None,
            change_pct: None,
        }
    }
}

/// Quotes every symbol in order.
///
/// A symbol that fails or has no data becomes a placeholder row.  When every
/// symbol fails the last error is returned instead, so an outage is not
/// cached as a page of dashes.
async fn fetch_rows(source: &dyn QuoteSource, symbols: &[String]) -> Result<Vec<QuoteRow>, SourceError> {
    let mut rows = Vec::with_capacity(symbols.len());
    let mut last_error = None;
    let mut failures = 0;
    for symbol in symbols {
        match source.quote(symbol).await {
            Ok(Some(q)) => rows.push(QuoteRow {
                symbol: symbol.clone(),
                price: Some(q.price),
                change_pct: Some(q.change_pct),
            }),
            Ok(None) => {
                debug!(symbol = %symbol, "no quote available");
                rows.push(QuoteRow::placeholder(symbol));
            }
            Err(e) => {
                warn!("quote for {symbol} failed: {e}");
                failures += 1;
                last_error = Some(e);
                rows.push(QuoteRow::placeholder(symbol));
            }
        }
    }
    match last_error {
        Some(e) if failures == symbols.len() => Err(e),
        _ => Ok(rows),
    }
}

pub struct PortfolioWidget {
    symbols: Vec<String>,
    show_change: bool,
    source: Arc<dyn QuoteSource>,
    cache: Arc<ApiCache>,
    rows: Vec<QuoteRow>,
    page: usize,
}

impl PortfolioWidget {
    pub fn new(config: &PortfolioConfig, source: Arc<dyn QuoteSource>, cache: Arc<ApiCache>) -> Self {
        Self {
            symbols: config.symbols.clone(),
            show_change: config.show_change,
            source,
            cache,
            rows: Vec::new(),
            page: 0,
        }
    }

    pub fn rows(&self) -> &[QuoteRow] {
        &self.rows
    }

    /// Zero-based page currently shown.
    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_count(&self) -> usize {
        self.rows.len().div_ceil(ITEMS_PER_PAGE).max(1)
    }

    /// Advances to the next page, wrapping to the first.
    pub fn next_page(&mut self) {
        self.page = (self.page + 1) % self.page_count();
    }

    fn cache_key(&self) -> String {
        format!("portfolio_{}", self.symbols.join("_"))
    }
}

#[async_trait]
impl Widget for PortfolioWidget {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn update(&mut self) -> Result<bool, WidgetError> {
        if self.symbols.is_empty() {
            return Ok(false);
        }
        let had_rows = !self.rows.is_empty();
        let source = Arc::clone(&self.source);
        let symbols = self.symbols.clone();
        let rows = self
            .cache
            .get_or_fetch(&self.cache_key(), PORTFOLIO_TTL, move || async move {
                fetch_rows(source.as_ref(), &symbols).await
            })
            .await
            .map_err(source_failed(NAME))?;
        info!("portfolio updated: {} symbols", rows.len());
        self.rows = rows;
        if had_rows {
            self.next_page();
        } else {
            self.page = 0;
        }
        if self.page >= self.page_count() {
            self.page = 0;
        }
        Ok(true)
    }

    fn render(&self, canvas: &mut Canvas<'_>, bounds: Bounds) {
        if self.rows.is_empty() {
            canvas.draw_text(
                "No portfolio data",
                bounds.center_x(),
                bounds.y + bounds.height as i32 / 2,
                FontSize::Medium,
                false,
                Anchor::Center,
            );
            return;
        }

        let pages = self.page_count();
        let title = if pages > 1 {
            format!("Portfolio ({}/{})", self.page + 1, pages)
        } else {
            "Portfolio".to_string()
        };
        canvas.draw_text(&title, bounds.x + 5, bounds.y + 3, FontSize::Small, true, Anchor::TopLeft);

        let offset = self.page * ITEMS_PER_PAGE;
        if pages > 1 {
            let right = bounds.right() - 5;
            if offset > 0 {
                canvas.draw_triangle_up(right - 16, bounds.y + 4, 7);
            }
            if offset + ITEMS_PER_PAGE < self.rows.len() {
                canvas.draw_triangle_down(right - 7, bounds.y + 4, 7);
            }
        }

        let line_height = (bounds.height.saturating_sub(22) / ITEMS_PER_PAGE as u32) as i32;
        if line_height == 0 {
            return;
        }
        let start_y = bounds.y + 18;
        for (i, row) in self.rows.iter().skip(offset).take(ITEMS_PER_PAGE).enumerate() {
            let y = start_y + i as i32 * line_height;
            if (offset + i) % 2 == 0 {
                let band = Bounds::new(bounds.x + 2, y - 2, bounds.width.saturating_sub(4), (line_height - 1) as u32);
                canvas.draw_rect(band, RectStyle::Shaded);
            }
            canvas.draw_text(&row.symbol, bounds.x + 5, y + 2, FontSize::Medium, true, Anchor::TopLeft);
            let price = row.price.map_or_else(|| "--".to_string(), format_price);
            canvas.draw_text(&price, bounds.x + 75, y + 2, FontSize::Small, false, Anchor::TopLeft);
            if let (true, Some(pct)) = (self.show_change, row.change_pct) {
                canvas.draw_text(
                    &format_change_pct(pct),
                    bounds.right() - 5,
                    y + 2,
                    FontSize::Small,
                    false,
                    Anchor::TopRight,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::sources::mock::MockQuoteSource;
    use crate::infrastructure::sources::AssetKind;
    use inkdash_core::Frame;
    use std::sync::atomic::Ordering;

    fn make_widget(symbols: &[&str]) -> (PortfolioWidget, Arc<MockQuoteSource>, Arc<ApiCache>) {
        let source = Arc::new(MockQuoteSource::new());
        let cache = Arc::new(ApiCache::new(
            std::env::temp_dir().join(format!("inkdash-portfolio-{}", uuid::Uuid::new_v4())),
        ));
        let config = PortfolioConfig {
            symbols: symbols.iter().map(|s| s.to_string()).collect(),
            ..PortfolioConfig::default()
        };
        let widget = PortfolioWidget::new(&config, source.clone(), cache.clone());
        (widget, source, cache)
    }

    #[tokio::test]
    async fn test_no_symbols_is_not_an_update() {
        let (mut widget, source, _) = make_widget(&[]);
        assert!(!widget.update().await.unwrap());
        assert_eq!(source.request_count(), 0);
    }

    #[tokio::test]
    async fn test_unpriced_symbols_become_placeholder_rows() {
        // Arrange
        let (mut widget, source, cache) = make_widget(&["BTC-USD", "AAPL", "NOPE"]);
        source.set_quote("BTC-USD", 64000.0, 2.5, AssetKind::Crypto);
        source.set_quote("AAPL", 190.0, -0.4, AssetKind::Stock);
        source.fail_symbol("NOPE");

        // Act
        widget.update().await.unwrap();

        // Assert
        let rows = widget.rows();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].price, Some(64000.0));
        assert_eq!(rows[2], QuoteRow::placeholder("NOPE"));
        std::fs::remove_dir_all(cache.dir()).ok();
    }

    #[tokio::test]
    async fn test_total_outage_is_an_error_and_keeps_rows() {
        // Arrange
        let (mut widget, source, cache) = make_widget(&["AAPL"]);
        source.set_quote("AAPL", 190.0, 1.0, AssetKind::Stock);
        widget.update().await.unwrap();
        cache.clear_all().await.unwrap();
        source.should_fail.store(true, Ordering::Relaxed);

        // Act
        let result = widget.update().await;

        // Assert
        assert!(result.is_err());
        assert_eq!(widget.rows()[0].price, Some(190.0));
        assert_eq!(cache.clear_all().await.unwrap(), 0);
        std::fs::remove_dir_all(cache.dir()).ok();
    }

    #[tokio::test]
    async fn test_pages_advance_and_wrap_on_refresh() {
        // Arrange: six symbols make two pages
        let (mut widget, source, cache) = make_widget(&["A", "B", "C", "D", "E", "F"]);
        for s in ["A", "B", "C", "D", "E", "F"] {
            source.set_quote(s, 10.0, 0.0, AssetKind::Stock);
        }

        // Act / Assert
        widget.update().await.unwrap();
        assert_eq!((widget.page(), widget.page_count()), (0, 2));
        widget.update().await.unwrap();
        assert_eq!(widget.page(), 1);
        widget.update().await.unwrap();
        assert_eq!(widget.page(), 0);
        std::fs::remove_dir_all(cache.dir()).ok();
    }

    #[test]
    fn test_render_empty_shows_placeholder() {
        let (widget, _, _) = make_widget(&["AAPL"]);
        let mut frame = Frame::new(250, 122);
        widget.render(&mut Canvas::new(&mut frame), Bounds::full(250, 122));
        assert!(frame.count_black() > 0);
    }

    #[tokio::test]
    async fn test_render_change_column_follows_show_change() {
        // Arrange
        let (mut widget, source, cache) = make_widget(&["AAPL"]);
        source.set_quote("AAPL", 190.0, 1.0, AssetKind::Stock);
        widget.update().await.unwrap();
        let change_column = Bounds::new(200, 18, 50, 100);

        // Act
        let mut with_change = Frame::new(250, 122);
        widget.render(&mut Canvas::new(&mut with_change), Bounds::full(250, 122));
        widget.show_change = false;
        let mut without_change = Frame::new(250, 122);
        widget.render(&mut Canvas::new(&mut without_change), Bounds::full(250, 122));

        // Assert
        assert!(with_change.count_black_in(change_column) > without_change.count_black_in(change_column));
        std::fs::remove_dir_all(cache.dir()).ok();
    }
}
