//! End-to-end tests of the REST API against a real configuration file.
//!
//! Each test builds the router over a temp `config.yaml` and drives it with
//! `tower::ServiceExt::oneshot`, then checks both the HTTP responses and what
//! the display service would read back with `load_config`.

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use inkdash_core::storage::config_store::{load_config, save_config};
use inkdash_core::{ConfigStore, DashboardConfig};
use inkdash_web::application::ConfigService;
use inkdash_web::infrastructure::{router, StaticGeocoder};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

struct Harness {
    dir: PathBuf,
    geocoder: Arc<StaticGeocoder>,
}

impl Harness {
    fn new() -> Self {
        let geocoder = StaticGeocoder::new()
            .with_place("90210", 34.0901, -118.4065, "Beverly Hills")
            .with_place("10001", 40.7484, -73.9967, "Manhattan");
        Self {
            dir: std::env::temp_dir().join(format!("inkdash_api_{}", Uuid::new_v4())),
            geocoder: Arc::new(geocoder),
        }
    }

    fn config_path(&self) -> PathBuf {
        self.dir.join("config.yaml")
    }

    fn app(&self) -> Router {
        let store = ConfigStore::new(self.config_path());
        router(Arc::new(ConfigService::new(store, self.geocoder.clone())))
    }

    async fn call(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(v) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        let response = self.app().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn on_disk(&self) -> DashboardConfig {
        load_config(&self.config_path()).unwrap()
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        std::fs::remove_dir_all(&self.dir).ok();
    }
}

#[tokio::test]
async fn test_posted_symbol_appears_in_symbol_list() {
    // Arrange
    let h = Harness::new();

    // Act
    let (status, _) = h
        .call(Method::POST, "/api/portfolio/symbol", Some(json!({"symbol": " nvda "})))
        .await;
    let (_, body) = h.call(Method::GET, "/api/portfolio/symbols", None).await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    assert!(body["symbols"].as_array().unwrap().contains(&json!("NVDA")));
    assert!(h.on_disk().portfolio.symbols.contains(&"NVDA".to_string()));
}

#[tokio::test]
async fn test_invalid_zip_is_rejected_and_location_unchanged() {
    // Arrange: a known location is already stored
    let h = Harness::new();
    let (status, body) = h
        .call(Method::POST, "/api/weather/location", Some(json!({"zip_code": "90210"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["location"], "Beverly Hills");
    let before = h.on_disk().weather;

    // Act
    let (status, body) = h
        .call(Method::POST, "/api/weather/location", Some(json!({"zip_code": "9O21O"})))
        .await;

    // Assert
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid ZIP code");
    assert_eq!(h.on_disk().weather, before);
    assert_eq!(h.geocoder.lookups(), 1);
}

#[tokio::test]
async fn test_location_update_returns_coordinates() {
    let h = Harness::new();

    let (status, body) = h
        .call(Method::POST, "/api/weather/location", Some(json!({"zip_code": "10001"})))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"success": true, "location": "Manhattan", "latitude": 40.7484, "longitude": -73.9967})
    );
    assert_eq!(h.on_disk().weather.zip_code.as_deref(), Some("10001"));
}

#[tokio::test]
async fn test_settings_are_all_or_nothing() {
    // Arrange
    let h = Harness::new();
    let (status, _) = h
        .call(Method::POST, "/api/settings", Some(json!({"refresh_interval": 5})))
        .await;
    assert_eq!(status, StatusCode::OK);

    // Act: a valid interval alongside an invalid unit
    let (status, body) = h
        .call(
            Method::POST,
            "/api/settings",
            Some(json!({"refresh_interval": 30, "weather_units": "kelvin"})),
        )
        .await;

    // Assert
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid units");
    assert_eq!(h.on_disk().refresh.interval_minutes, 5);
}

#[tokio::test]
async fn test_settings_form_values_as_strings_are_accepted() {
    // Arrange
    let h = Harness::new();

    // Act
    let (status, body) = h
        .call(
            Method::POST,
            "/api/settings",
            Some(json!({"refresh_interval": "5", "weather_forecast_days": 4.0, "network_show_bandwidth": "off"})),
        )
        .await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true}));
    let cfg = h.on_disk();
    assert_eq!(cfg.refresh.interval_minutes, 5);
    assert_eq!(cfg.weather.show_forecast_days, 4);
    assert!(!cfg.network.show_bandwidth);
}

#[tokio::test]
async fn test_non_numeric_setting_gets_range_message() {
    let h = Harness::new();

    let (status, body) = h
        .call(Method::POST, "/api/settings", Some(json!({"clock_update_seconds": "often"})))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Clock update must be 10-300 seconds");
}

#[tokio::test]
async fn test_holdings_rebuild_symbol_list() {
    // Arrange
    let h = Harness::new();
    let holdings = json!({"holdings": [
        {"symbol": "aapl", "shares": 10, "cost_basis": 150.5},
        {"symbol": "BTC-USD", "shares": 0.25}
    ]});

    // Act
    let (status, body) = h.call(Method::POST, "/api/portfolio/holdings", Some(holdings)).await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["holdings"][0]["symbol"], "AAPL");
    assert_eq!(body["holdings"][1]["cost_basis"], 0.0);
    assert_eq!(h.on_disk().portfolio.symbols, vec!["AAPL", "BTC-USD"]);
}

#[tokio::test]
async fn test_deleting_holding_removes_symbol_too() {
    let h = Harness::new();
    h.call(
        Method::POST,
        "/api/portfolio/holding",
        Some(json!({"symbol": "MSFT", "shares": 3, "cost_basis": 300})),
    )
    .await;

    let (status, body) = h.call(Method::DELETE, "/api/portfolio/holding/msft", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "holdings": []}));
    assert!(h.on_disk().portfolio.symbols.is_empty());
}

#[tokio::test]
async fn test_unknown_keys_survive_an_update() {
    // Arrange: a hand-edited file with a section this build does not know
    let h = Harness::new();
    std::fs::create_dir_all(&h.dir).unwrap();
    std::fs::write(
        h.config_path(),
        "news:\n  headlines: 5\nportfolio:\n  symbols: [AAPL]\n",
    )
    .unwrap();

    // Act
    h.call(Method::POST, "/api/portfolio/symbol", Some(json!({"symbol": "MSFT"})))
        .await;

    // Assert
    let content = std::fs::read_to_string(h.config_path()).unwrap();
    assert!(content.contains("news:"));
    assert!(content.contains("headlines: 5"));
    assert_eq!(h.on_disk().portfolio.symbols, vec!["AAPL", "MSFT"]);
}

#[tokio::test]
async fn test_get_config_reflects_file() {
    let h = Harness::new();
    let mut config = DashboardConfig::default();
    config.weather.location_name = Some("Springfield".to_string());
    save_config(&h.config_path(), &config).unwrap();

    let (status, body) = h.call(Method::GET, "/api/config", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["weather"]["location_name"], "Springfield");
}
