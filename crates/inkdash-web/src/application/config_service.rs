//! One operation per REST endpoint, applied to the configuration file.
//!
//! Every write goes through [`ConfigStore::update`], so the load, the change
//! and the save happen under one lock and a failed validation leaves the file
//! untouched.  The display service notices the change on its next refresh.

use std::sync::Arc;

use inkdash_core::domain::config::validate_zip;
use inkdash_core::{ConfigError, ConfigStore, DashboardConfig, Holding, SettingsPatch, StoreError};
use thiserror::Error;
use tracing::info;

use super::geocoder::{GeocodeError, Geocoder};
use crate::domain::GeoLocation;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// The requested change breaks a configuration rule.
    #[error(transparent)]
    Invalid(#[from] ConfigError),

    #[error("ZIP code not found")]
    ZipNotFound,

    #[error(transparent)]
    Geocoder(#[from] GeocodeError),

    /// The configuration file could not be read or written.
    #[error(transparent)]
    Storage(StoreError),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Rejected(e) => Self::Invalid(e),
            other => Self::Storage(other),
        }
    }
}

pub struct ConfigService {
    store: ConfigStore,
    geocoder: Arc<dyn Geocoder>,
}

impl ConfigService {
    pub fn new(store: ConfigStore, geocoder: Arc<dyn Geocoder>) -> Self {
        Self { store, geocoder }
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    pub async fn config(&self) -> Result<DashboardConfig, ServiceError> {
        Ok(self.store.load().await?)
    }

    // ── Weather ───────────────────────────────────────────────────────────────

    /// Geocodes `zip` and stores it as the weather location.
    ///
    /// The ZIP code is validated before the geocoder is called, and nothing is
    /// written unless the lookup succeeds.
    pub async fn set_location(&self, zip: &str) -> Result<GeoLocation, ServiceError> {
        let zip = validate_zip(zip)?;
        let location = self
            .geocoder
            .locate(&zip)
            .await?
            .ok_or(ServiceError::ZipNotFound)?;
        self.store
            .update(|config| {
                config.set_weather_location(&zip, location.latitude, location.longitude, location.city.clone())
            })
            .await?;
        info!(
            "weather location set to {} ({}, {})",
            location.city, location.latitude, location.longitude
        );
        Ok(location)
    }

    // ── Symbols ───────────────────────────────────────────────────────────────

    pub async fn symbols(&self) -> Result<Vec<String>, ServiceError> {
        Ok(self.store.load().await?.portfolio.symbols)
    }

    /// Replaces the watch list.  Returns the stored (normalized) list.
    pub async fn set_symbols(&self, symbols: &[String]) -> Result<Vec<String>, ServiceError> {
        let (_, config) = self.store.update(|config| config.set_symbols(symbols)).await?;
        info!("portfolio symbols set: {}", config.portfolio.symbols.join(", "));
        Ok(config.portfolio.symbols)
    }

    /// Adds one symbol; already-tracked symbols are left alone.
    pub async fn add_symbol(&self, symbol: &str) -> Result<Vec<String>, ServiceError> {
        let (added, config) = self.store.update(|config| config.add_symbol(symbol)).await?;
        if added {
            info!("portfolio symbol added: {}", symbol.trim().to_uppercase());
        }
        Ok(config.portfolio.symbols)
    }

    /// Removing an untracked symbol is not an error.
    pub async fn remove_symbol(&self, symbol: &str) -> Result<Vec<String>, ServiceError> {
        let (removed, config) = self
            .store
            .update(|config| Ok(config.remove_symbol(symbol)))
            .await?;
        if removed {
            info!("portfolio symbol removed: {}", symbol.trim().to_uppercase());
        }
        Ok(config.portfolio.symbols)
    }

    // ── Holdings ──────────────────────────────────────────────────────────────

    pub async fn holdings(&self) -> Result<Vec<Holding>, ServiceError> {
        Ok(self.store.load().await?.portfolio.holdings)
    }

    /// Replaces every holding; the watch list is rebuilt from them.
    pub async fn set_holdings(&self, holdings: Vec<Holding>) -> Result<Vec<Holding>, ServiceError> {
        let (_, config) = self.store.update(|config| config.set_holdings(holdings)).await?;
        info!("portfolio holdings set: {} positions", config.portfolio.holdings.len());
        Ok(config.portfolio.holdings)
    }

    pub async fn upsert_holding(&self, holding: Holding) -> Result<Vec<Holding>, ServiceError> {
        let (_, config) = self.store.update(|config| config.upsert_holding(holding)).await?;
        Ok(config.portfolio.holdings)
    }

    pub async fn remove_holding(&self, symbol: &str) -> Result<Vec<Holding>, ServiceError> {
        let (removed, config) = self
            .store
            .update(|config| Ok(config.remove_holding(symbol)))
            .await?;
        if removed {
            info!("portfolio holding removed: {}", symbol.trim().to_uppercase());
        }
        Ok(config.portfolio.holdings)
    }

    // ── Settings ──────────────────────────────────────────────────────────────

    /// Applies a settings patch, all fields or none.
    pub async fn apply_settings(&self, patch: &SettingsPatch) -> Result<(), ServiceError> {
        self.store.update(|config| config.apply_settings(patch)).await?;
        info!("settings updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::geocoder::MockGeocoder;
    use std::path::PathBuf;
    use uuid::Uuid;

    struct TempConfig {
        dir: PathBuf,
    }

    impl TempConfig {
        fn new() -> Self {
            Self {
                dir: std::env::temp_dir().join(format!("inkdash_web_{}", Uuid::new_v4())),
            }
        }

        fn path(&self) -> PathBuf {
            self.dir.join("config.yaml")
        }
    }

    impl Drop for TempConfig {
        fn drop(&mut self) {
            std::fs::remove_dir_all(&self.dir).ok();
        }
    }

    fn service(tmp: &TempConfig, geocoder: MockGeocoder) -> ConfigService {
        ConfigService::new(ConfigStore::new(tmp.path()), Arc::new(geocoder))
    }

    fn beverly_hills() -> GeoLocation {
        GeoLocation {
            latitude: 34.09,
            longitude: -118.41,
            city: "Beverly Hills".to_string(),
        }
    }

    #[tokio::test]
    async fn test_set_location_stores_geocoded_result() {
        // Arrange
        let tmp = TempConfig::new();
        let mut geocoder = MockGeocoder::new();
        geocoder
            .expect_locate()
            .withf(|zip: &str| zip == "90210")
            .times(1)
            .returning(|_| Ok(Some(beverly_hills())));
        let svc = service(&tmp, geocoder);

        // Act
        let location = svc.set_location(" 90210 ").await.unwrap();

        // Assert
        assert_eq!(location.city, "Beverly Hills");
        let weather = svc.config().await.unwrap().weather;
        assert_eq!(weather.zip_code.as_deref(), Some("90210"));
        assert_eq!(weather.latitude, 34.09);
        assert_eq!(weather.location_name.as_deref(), Some("Beverly Hills"));
    }

    #[tokio::test]
    async fn test_invalid_zip_never_reaches_geocoder() {
        // Arrange
        let tmp = TempConfig::new();
        let mut geocoder = MockGeocoder::new();
        geocoder.expect_locate().times(0);
        let svc = service(&tmp, geocoder);
        let before = svc.config().await.unwrap();

        // Act
        let result = svc.set_location("9021").await;

        // Assert
        assert!(matches!(result, Err(ServiceError::Invalid(ConfigError::InvalidZip))));
        assert_eq!(svc.config().await.unwrap(), before);
        assert!(!tmp.path().exists());
    }

    #[tokio::test]
    async fn test_unknown_zip_leaves_location_unchanged() {
        let tmp = TempConfig::new();
        let mut geocoder = MockGeocoder::new();
        geocoder.expect_locate().returning(|_| Ok(None));
        let svc = service(&tmp, geocoder);

        let result = svc.set_location("00000").await;

        assert!(matches!(result, Err(ServiceError::ZipNotFound)));
        assert_eq!(svc.config().await.unwrap().weather.zip_code, None);
    }

    #[tokio::test]
    async fn test_geocoder_failure_is_reported() {
        let tmp = TempConfig::new();
        let mut geocoder = MockGeocoder::new();
        geocoder
            .expect_locate()
            .returning(|_| Err(GeocodeError::Request("timed out".to_string())));
        let svc = service(&tmp, geocoder);

        assert!(matches!(svc.set_location("10001").await, Err(ServiceError::Geocoder(_))));
    }

    #[tokio::test]
    async fn test_add_symbol_is_idempotent() {
        // Arrange
        let tmp = TempConfig::new();
        let svc = service(&tmp, MockGeocoder::new());
        svc.set_symbols(&[]).await.unwrap();

        // Act
        svc.add_symbol("nvda").await.unwrap();
        let symbols = svc.add_symbol("NVDA ").await.unwrap();

        // Assert
        assert_eq!(symbols, vec!["NVDA"]);
        assert_eq!(svc.symbols().await.unwrap(), vec!["NVDA"]);
    }

    #[tokio::test]
    async fn test_blank_symbol_is_invalid() {
        let tmp = TempConfig::new();
        let svc = service(&tmp, MockGeocoder::new());
        let result = svc.add_symbol("   ").await;
        assert!(matches!(result, Err(ServiceError::Invalid(ConfigError::InvalidSymbol))));
    }

    #[tokio::test]
    async fn test_remove_symbol_is_case_insensitive() {
        let tmp = TempConfig::new();
        let svc = service(&tmp, MockGeocoder::new());
        svc.set_symbols(&["AAPL".to_string(), "MSFT".to_string()]).await.unwrap();

        let symbols = svc.remove_symbol("msft").await.unwrap();

        assert_eq!(symbols, vec!["AAPL"]);
    }

    #[tokio::test]
    async fn test_rejected_settings_write_nothing() {
        // Arrange
        let tmp = TempConfig::new();
        let svc = service(&tmp, MockGeocoder::new());
        let before = svc.config().await.unwrap();
        let patch = SettingsPatch {
            refresh_interval: Some(5),
            weather_forecast_days: Some(9),
            ..SettingsPatch::default()
        };

        // Act
        let result = svc.apply_settings(&patch).await;

        // Assert
        assert!(matches!(
            result,
            Err(ServiceError::Invalid(ConfigError::ForecastDaysOutOfRange))
        ));
        assert_eq!(svc.config().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_upsert_holding_replaces_existing() {
        let tmp = TempConfig::new();
        let svc = service(&tmp, MockGeocoder::new());
        let holding = |shares: f64| Holding {
            symbol: "aapl".to_string(),
            shares,
            cost_basis: 150.0,
        };

        svc.upsert_holding(holding(10.0)).await.unwrap();
        let holdings = svc.upsert_holding(holding(12.0)).await.unwrap();

        assert_eq!(holdings.iter().filter(|h| h.symbol == "AAPL").count(), 1);
        assert_eq!(holdings.iter().find(|h| h.symbol == "AAPL").unwrap().shares, 12.0);
    }

    #[tokio::test]
    async fn test_unreadable_store_is_storage_error() {
        // Arrange: the config "directory" is a regular file
        let tmp = TempConfig::new();
        std::fs::create_dir_all(&tmp.dir).unwrap();
        let blocker = tmp.dir.join("not-a-dir");
        std::fs::write(&blocker, "x").unwrap();
        let svc = ConfigService::new(ConfigStore::new(blocker.join("config.yaml")), Arc::new(MockGeocoder::new()));

        // Act
        let result = svc.symbols().await;

        // Assert
        assert!(matches!(result, Err(ServiceError::Storage(_))));
    }
}
