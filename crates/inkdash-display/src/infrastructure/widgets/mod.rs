//! Concrete widgets and the factory that builds them from configuration.
//!
//! | Config name          | Widget                                      |
//! |----------------------|---------------------------------------------|
//! | `clock`              | [`clock::ClockWidget`]                      |
//! | `weather`            | [`weather::WeatherWidget`]                  |
//! | `portfolio`          | [`portfolio::PortfolioWidget`]              |
//! | `portfolio_summary`  | [`portfolio_summary::PortfolioSummaryWidget`] |
//! | `network`            | [`network::NetworkWidget`]                  |
//!
//! `clock_compact` and `weather_compact` are accepted as aliases: every
//! widget already switches to a compact layout when its strip is short.

pub mod clock;
pub mod network;
pub mod portfolio;
pub mod portfolio_summary;
pub mod weather;

use std::sync::Arc;

use inkdash_core::DashboardConfig;

use crate::application::dashboard::WidgetFactory;
use crate::application::widget::{Widget, WidgetError};
use crate::infrastructure::api_cache::ApiCache;
use crate::infrastructure::sources::open_meteo::OpenMeteoSource;
use crate::infrastructure::sources::proc_net::ProcNetSource;
use crate::infrastructure::sources::quotes::HttpQuoteSource;
use crate::infrastructure::sources::{CounterSource, QuoteSource, SourceError, WeatherSource};

/// Wraps a [`SourceError`] for the widget called `widget`.
pub(crate) fn source_failed(widget: &'static str) -> impl Fn(SourceError) -> WidgetError {
    move |e| WidgetError::Source {
        widget,
        message: e.to_string(),
    }
}

/// Where quote widgets get their prices.
enum QuoteProvider {
    /// CoinGecko + Finnhub, rebuilt per configuration so a new Finnhub key
    /// takes effect on reload.
    Http,
    Fixed(Arc<dyn QuoteSource>),
}

/// Builds widgets backed by shared data sources and one response cache.
pub struct DefaultWidgetFactory {
    weather: Arc<dyn WeatherSource>,
    quotes: QuoteProvider,
    counters: Arc<dyn CounterSource>,
    cache: Arc<ApiCache>,
}

impl DefaultWidgetFactory {
    /// Factory over the production sources: Open-Meteo, CoinGecko/Finnhub,
    /// and `/proc/net`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the HTTP client cannot be built.
    pub fn production(cache: Arc<ApiCache>) -> Result<Self, SourceError> {
        Ok(Self {
            weather: Arc::new(OpenMeteoSource::new()?),
            quotes: QuoteProvider::Http,
            counters: Arc::new(ProcNetSource::new()),
            cache,
        })
    }

    /// Factory over caller-supplied sources.
    pub fn with_sources(
        weather: Arc<dyn WeatherSource>,
        quotes: Arc<dyn QuoteSource>,
        counters: Arc<dyn CounterSource>,
        cache: Arc<ApiCache>,
    ) -> Self {
        Self {
            weather,
            quotes: QuoteProvider::Fixed(quotes),
            counters,
            cache,
        }
    }

    fn quote_source(&self, config: &DashboardConfig) -> Option<Arc<dyn QuoteSource>> {
        match &self.quotes {
            QuoteProvider::Fixed(source) => Some(Arc::clone(source)),
            QuoteProvider::Http => match HttpQuoteSource::new(config.portfolio.finnhub_api_key.clone()) {
                Ok(source) => Some(Arc::new(source)),
                Err(e) => {
                    tracing::error!("cannot create quote client: {e}");
                    None
                }
            },
        }
    }
}

impl WidgetFactory for DefaultWidgetFactory {
    fn build(&self, name: &str, config: &DashboardConfig) -> Option<Box<dyn Widget>> {
        let widget: Box<dyn Widget> = match name {
            "clock" | "clock_compact" => Box::new(clock::ClockWidget::new(config.clock.format)),
            "weather" | "weather_compact" => Box::new(weather::WeatherWidget::new(
                &config.weather,
                Arc::clone(&self.weather),
                Arc::clone(&self.cache),
            )),
            "portfolio" => Box::new(portfolio::PortfolioWidget::new(
                &config.portfolio,
                self.quote_source(config)?,
                Arc::clone(&self.cache),
            )),
            "portfolio_summary" => Box::new(portfolio_summary::PortfolioSummaryWidget::new(
                &config.portfolio,
                self.quote_source(config)?,
                Arc::clone(&self.cache),
            )),
            "network" => Box::new(network::NetworkWidget::new(
                &config.network,
                Arc::clone(&self.counters),
            )),
            _ => return None,
        };
        Some(widget)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::sources::mock::{MockCounterSource, MockQuoteSource, MockWeatherSource};
    use crate::infrastructure::sources::WeatherReport;

    fn factory() -> DefaultWidgetFactory {
        let report = WeatherReport {
            current_temp: 50.0,
            current_code: 0,
            daily: Vec::new(),
        };
        DefaultWidgetFactory::with_sources(
            Arc::new(MockWeatherSource::new(report)),
            Arc::new(MockQuoteSource::new()),
            Arc::new(MockCounterSource::new()),
            Arc::new(ApiCache::new(std::env::temp_dir().join("inkdash-factory-unused"))),
        )
    }

    #[test]
    fn test_factory_builds_every_known_widget() {
        // Arrange
        let f = factory();
        let cfg = DashboardConfig::default();

        // Act / Assert
        for name in ["clock", "weather", "portfolio", "portfolio_summary", "network"] {
            let widget = f.build(name, &cfg).unwrap();
            assert_eq!(widget.name(), name);
        }
    }

    #[test]
    fn test_factory_accepts_compact_aliases() {
        let f = factory();
        let cfg = DashboardConfig::default();
        assert_eq!(f.build("clock_compact", &cfg).unwrap().name(), "clock");
        assert_eq!(f.build("weather_compact", &cfg).unwrap().name(), "weather");
    }

    #[test]
    fn test_factory_rejects_unknown_names() {
        assert!(factory().build("news", &DashboardConfig::default()).is_none());
    }
}
