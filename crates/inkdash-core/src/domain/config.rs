//! The dashboard configuration document.
//!
//! A single YAML file holds every setting both services need.  The display
//! service reads it to decide which widgets to draw and how often; the web
//! panel reads it, applies one of the validated mutations below, and writes
//! it back.  An example:
//!
//! ```yaml
//! display:
//!   width: 250
//!   height: 122
//! refresh:
//!   interval_minutes: 15
//! widgets: [clock, weather, portfolio, network]
//! weather:
//!   zip_code: "10001"
//!   latitude: 40.7506
//!   longitude: -73.9972
//!   units: fahrenheit
//! portfolio:
//!   symbols: [AAPL, BTC-USD]
//! ```
//!
//! # Serde default values
//!
//! Every section and every field is optional.  Fields annotated with
//! `#[serde(default = "some_fn")]` take the value of `some_fn()` when absent,
//! so a brand-new install can start from an empty file and an older file keeps
//! working after new settings are added.
//!
//! Top-level keys this crate does not model (for example a `touch:` section
//! left over from other tooling) are kept in [`DashboardConfig::extra`] and
//! written back unchanged.
//!
//! # Mutations
//!
//! Each mutation validates its whole input before touching `self`.  On error
//! the document is left exactly as it was, which is what lets the web panel
//! promise "an invalid ZIP code is rejected and the stored location is
//! unchanged".

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::de::{self, IgnoredAny};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Validation failures raised by configuration mutations.
///
/// The `Display` text of each variant is the user-facing message returned by
/// the web panel, so keep it short and human-readable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// ZIP code is not exactly five ASCII digits.
    #[error("Invalid ZIP code")]
    InvalidZip,

    /// A ticker symbol was empty after trimming.
    #[error("Invalid symbol")]
    InvalidSymbol,

    #[error("Interval must be 1-60 minutes")]
    RefreshIntervalOutOfRange,

    #[error("Clock update must be 10-300 seconds")]
    ClockUpdateOutOfRange,

    /// Temperature unit other than `fahrenheit` or `celsius`.
    #[error("Invalid units")]
    InvalidUnits,

    #[error("Forecast days must be 1-7")]
    ForecastDaysOutOfRange,
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration document stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardConfig {
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
    /// Enabled widgets, top to bottom, for single-screen mode and for the
    /// default screen list in multi-screen mode.
    #[serde(default = "default_widgets")]
    pub widgets: Vec<String>,
    /// Explicit screens for multi-screen mode.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub screens: Vec<ScreenConfig>,
    #[serde(default)]
    pub clock: ClockConfig,
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub portfolio: PortfolioConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    /// Unmodelled top-level sections, preserved verbatim on rewrite.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

/// Panel geometry and output backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DisplayConfig {
    /// Logical canvas width in pixels (landscape).
    #[serde(default = "default_width")]
    pub width: u32,
    /// Logical canvas height in pixels.
    #[serde(default = "default_height")]
    pub height: u32,
    /// Show one screen at a time instead of stacking every widget.
    #[serde(default = "default_true")]
    pub multi_screen_mode: bool,
    /// Advance to the next screen on every refresh cycle.
    #[serde(default)]
    pub rotate_screens: bool,
    #[serde(default)]
    pub backend: DisplayBackend,
    /// Where the simulation backend writes its PBM image.
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
    /// Where the raw backend writes the packed panel buffer.
    #[serde(default = "default_device_path")]
    pub device_path: PathBuf,
    /// Native panel width in its own (portrait) orientation.
    #[serde(default = "default_panel_width")]
    pub panel_width: u32,
    /// Native panel height in its own (portrait) orientation.
    #[serde(default = "default_panel_height")]
    pub panel_height: u32,
}

/// Which panel backend the display driver talks to.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DisplayBackend {
    /// No hardware: write a PBM image to `output_path`.
    #[default]
    Simulation,
    /// Write the packed 1-bpp panel buffer to `device_path`.
    Raw,
}

/// Refresh timing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RefreshConfig {
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u32,
    /// Partial redraw cadence for screens showing a clock.
    #[serde(default = "default_clock_update_seconds")]
    pub clock_update_seconds: u32,
}

/// One named screen in multi-screen mode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScreenConfig {
    #[serde(default = "default_screen_name")]
    pub name: String,
    #[serde(default)]
    pub widgets: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ClockConfig {
    #[serde(default)]
    pub format: ClockFormat,
}

/// 12-hour (`3:07 PM`) or 24-hour (`15:07`) clock face.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum ClockFormat {
    #[default]
    #[serde(rename = "12h")]
    TwelveHour,
    #[serde(rename = "24h")]
    TwentyFourHour,
}

/// Weather location and presentation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeatherConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    #[serde(default = "default_latitude")]
    pub latitude: f64,
    #[serde(default = "default_longitude")]
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_name: Option<String>,
    #[serde(default)]
    pub units: TemperatureUnit,
    #[serde(default = "default_forecast_days")]
    pub show_forecast_days: u32,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Fahrenheit,
    Celsius,
}

impl TemperatureUnit {
    /// Parses the wire name used by the settings form.
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value {
            "fahrenheit" => Ok(Self::Fahrenheit),
            "celsius" => Ok(Self::Celsius),
            _ => Err(ConfigError::InvalidUnits),
        }
    }

    /// Query-string value understood by the forecast API.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fahrenheit => "fahrenheit",
            Self::Celsius => "celsius",
        }
    }

    /// Suffix drawn after a temperature, e.g. `°F`.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Fahrenheit => "°F",
            Self::Celsius => "°C",
        }
    }
}

/// Tracked symbols and optional holdings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PortfolioConfig {
    #[serde(default)]
    pub symbols: Vec<String>,
    #[serde(default)]
    pub holdings: Vec<Holding>,
    #[serde(default = "default_true")]
    pub show_change: bool,
    /// Finnhub token; stock quotes are skipped when empty.
    #[serde(default)]
    pub finnhub_api_key: String,
}

/// A position used by the portfolio summary widget.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Holding {
    pub symbol: String,
    #[serde(default)]
    pub shares: f64,
    #[serde(default)]
    pub cost_basis: f64,
}

/// Network monitor options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkConfig {
    /// Interface to watch; `None` picks the busiest non-loopback interface.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,
    #[serde(default = "default_true")]
    pub show_bandwidth: bool,
    #[serde(default)]
    pub show_devices: bool,
}

/// API response cache location.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheConfig {
    #[serde(default = "default_cache_dir")]
    pub dir: PathBuf,
}

/// Partial update accepted by the settings endpoint.
///
/// Numbers are signed so out-of-range input (e.g. `-5`) reaches the range
/// check and produces its specific message instead of a generic parse error.
///
/// Browsers posting form values send strings, so numeric fields also accept
/// `"5"` and `5.0`.  Anything that is not a whole number fails the field's
/// range check.  Flags accept `true`/`false`, `"on"`/`"off"`, `"yes"`/`"no"`,
/// and `0`/`1`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SettingsPatch {
    #[serde(default, deserialize_with = "loose_int")]
    pub refresh_interval: Option<i64>,
    #[serde(default, deserialize_with = "loose_int")]
    pub clock_update_seconds: Option<i64>,
    #[serde(default)]
    pub weather_units: Option<String>,
    #[serde(default, deserialize_with = "loose_int")]
    pub weather_forecast_days: Option<i64>,
    #[serde(default, deserialize_with = "loose_bool")]
    pub network_show_bandwidth: Option<bool>,
    #[serde(default, deserialize_with = "loose_bool")]
    pub network_show_devices: Option<bool>,
}

/// Stands in for a value that is not a whole number; no range contains it.
const NOT_A_WHOLE_NUMBER: i64 = i64::MIN;

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseInt {
    Int(i64),
    Float(f64),
    Text(String),
    Other(IgnoredAny),
}

fn whole_number(value: f64) -> i64 {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        value as i64
    } else {
        NOT_A_WHOLE_NUMBER
    }
}

fn loose_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    let raw = Option::<LooseInt>::deserialize(deserializer)?;
    Ok(raw.map(|raw| match raw {
        LooseInt::Int(v) => v,
        LooseInt::Float(v) => whole_number(v),
        LooseInt::Text(text) => {
            let text = text.trim();
            text.parse::<i64>()
                .ok()
                .or_else(|| text.parse::<f64>().ok().map(whole_number))
                .unwrap_or(NOT_A_WHOLE_NUMBER)
        }
        LooseInt::Other(_) => NOT_A_WHOLE_NUMBER,
    }))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseBool {
    Bool(bool),
    Int(i64),
    Text(String),
}

fn loose_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    let Some(raw) = Option::<LooseBool>::deserialize(deserializer)? else {
        return Ok(None);
    };
    match raw {
        LooseBool::Bool(b) => Ok(Some(b)),
        LooseBool::Int(v) => Ok(Some(v != 0)),
        LooseBool::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "on" | "yes" | "1" => Ok(Some(true)),
            "false" | "off" | "no" | "0" | "" => Ok(Some(false)),
            other => Err(de::Error::custom(format!("expected a boolean, got {other:?}"))),
        },
    }
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_true() -> bool {
    true
}
fn default_width() -> u32 {
    250
}
fn default_height() -> u32 {
    122
}
fn default_panel_width() -> u32 {
    122
}
fn default_panel_height() -> u32 {
    250
}
fn default_output_path() -> PathBuf {
    PathBuf::from(".cache/display_output.pbm")
}
fn default_device_path() -> PathBuf {
    PathBuf::from("/dev/epaper")
}
fn default_interval_minutes() -> u32 {
    15
}
fn default_clock_update_seconds() -> u32 {
    60
}
fn default_widgets() -> Vec<String> {
    ["clock", "weather", "portfolio", "network"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_screen_name() -> String {
    "Unnamed".to_string()
}
fn default_latitude() -> f64 {
    40.7128
}
fn default_longitude() -> f64 {
    -74.0060
}
fn default_forecast_days() -> u32 {
    3
}
fn default_cache_dir() -> PathBuf {
    PathBuf::from(".cache")
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            display: DisplayConfig::default(),
            refresh: RefreshConfig::default(),
            widgets: default_widgets(),
            screens: Vec::new(),
            clock: ClockConfig::default(),
            weather: WeatherConfig::default(),
            portfolio: PortfolioConfig::default(),
            network: NetworkConfig::default(),
            cache: CacheConfig::default(),
            extra: BTreeMap::new(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            multi_screen_mode: default_true(),
            rotate_screens: false,
            backend: DisplayBackend::default(),
            output_path: default_output_path(),
            device_path: default_device_path(),
            panel_width: default_panel_width(),
            panel_height: default_panel_height(),
        }
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_minutes: default_interval_minutes(),
            clock_update_seconds: default_clock_update_seconds(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            zip_code: None,
            latitude: default_latitude(),
            longitude: default_longitude(),
            location_name: None,
            units: TemperatureUnit::default(),
            show_forecast_days: default_forecast_days(),
        }
    }
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            symbols: Vec::new(),
            holdings: Vec::new(),
            show_change: default_true(),
            finnhub_api_key: String::new(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            interface: None,
            show_bandwidth: default_true(),
            show_devices: false,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
        }
    }
}

// ── Validation helpers ────────────────────────────────────────────────────────

/// Validates a US ZIP code and returns it trimmed.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidZip`] unless the trimmed input is exactly
/// five ASCII digits.
pub fn validate_zip(raw: &str) -> Result<String, ConfigError> {
    let zip = raw.trim();
    if zip.len() == 5 && zip.bytes().all(|b| b.is_ascii_digit()) {
        Ok(zip.to_string())
    } else {
        Err(ConfigError::InvalidZip)
    }
}

/// Trims and upper-cases a ticker symbol.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidSymbol`] when nothing is left after trimming.
pub fn normalize_symbol(raw: &str) -> Result<String, ConfigError> {
    let symbol = raw.trim().to_uppercase();
    if symbol.is_empty() {
        Err(ConfigError::InvalidSymbol)
    } else {
        Ok(symbol)
    }
}

fn check_range(value: i64, min: i64, max: i64, err: ConfigError) -> Result<u32, ConfigError> {
    if (min..=max).contains(&value) {
        // The range bounds are small positive numbers, so the cast is lossless.
        Ok(value as u32)
    } else {
        Err(err)
    }
}

// ── Queries ───────────────────────────────────────────────────────────────────

impl DashboardConfig {
    /// Time between full refresh cycles.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.refresh.interval_minutes) * 60)
    }

    /// Time between partial clock redraws.
    pub fn clock_update_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.refresh.clock_update_seconds))
    }

    /// Canvas size as `(width, height)`.
    pub fn display_size(&self) -> (u32, u32) {
        (self.display.width, self.display.height)
    }

    /// Screens to build in multi-screen mode.
    ///
    /// Explicit `screens` win; otherwise every enabled widget gets a screen of
    /// its own, named after the widget.
    pub fn screen_configs(&self) -> Vec<ScreenConfig> {
        if !self.screens.is_empty() {
            return self.screens.clone();
        }
        self.widgets
            .iter()
            .map(|w| ScreenConfig {
                name: w.clone(),
                widgets: vec![w.clone()],
            })
            .collect()
    }
}

// ── Mutations ─────────────────────────────────────────────────────────────────

impl DashboardConfig {
    /// Stores a geocoded weather location.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidZip`] without modifying `self` when `zip`
    /// is malformed.
    pub fn set_weather_location(
        &mut self,
        zip: &str,
        latitude: f64,
        longitude: f64,
        location_name: String,
    ) -> Result<(), ConfigError> {
        let zip = validate_zip(zip)?;
        self.weather.zip_code = Some(zip);
        self.weather.latitude = latitude;
        self.weather.longitude = longitude;
        self.weather.location_name = Some(location_name);
        Ok(())
    }

    /// Replaces the tracked symbol list.
    ///
    /// Symbols are normalized and de-duplicated, keeping the first occurrence.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSymbol`] if any entry is blank; the list
    /// is not modified in that case.
    pub fn set_symbols(&mut self, raw: &[String]) -> Result<(), ConfigError> {
        let mut symbols: Vec<String> = Vec::with_capacity(raw.len());
        for entry in raw {
            let symbol = normalize_symbol(entry)?;
            if !symbols.contains(&symbol) {
                symbols.push(symbol);
            }
        }
        self.portfolio.symbols = symbols;
        Ok(())
    }

    /// Appends a symbol unless it is already tracked.
    ///
    /// Returns `true` when the list changed.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSymbol`] for a blank symbol.
    pub fn add_symbol(&mut self, raw: &str) -> Result<bool, ConfigError> {
        let symbol = normalize_symbol(raw)?;
        if self.portfolio.symbols.contains(&symbol) {
            return Ok(false);
        }
        self.portfolio.symbols.push(symbol);
        Ok(true)
    }

    /// Removes a symbol, matching case-insensitively.
    ///
    /// Returns `true` when the list changed.
    pub fn remove_symbol(&mut self, raw: &str) -> bool {
        let symbol = raw.trim().to_uppercase();
        let before = self.portfolio.symbols.len();
        self.portfolio.symbols.retain(|s| *s != symbol);
        self.portfolio.symbols.len() != before
    }

    /// Applies a settings patch, all or nothing.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure found.  No field is written unless
    /// every present field is valid.
    pub fn apply_settings(&mut self, patch: &SettingsPatch) -> Result<(), ConfigError> {
        let interval = patch
            .refresh_interval
            .map(|v| check_range(v, 1, 60, ConfigError::RefreshIntervalOutOfRange))
            .transpose()?;
        let clock_seconds = patch
            .clock_update_seconds
            .map(|v| check_range(v, 10, 300, ConfigError::ClockUpdateOutOfRange))
            .transpose()?;
        let units = patch
            .weather_units
            .as_deref()
            .map(TemperatureUnit::parse)
            .transpose()?;
        let forecast_days = patch
            .weather_forecast_days
            .map(|v| check_range(v, 1, 7, ConfigError::ForecastDaysOutOfRange))
            .transpose()?;

        if let Some(v) = interval {
            self.refresh.interval_minutes = v;
        }
        if let Some(v) = clock_seconds {
            self.refresh.clock_update_seconds = v;
        }
        if let Some(v) = units {
            self.weather.units = v;
        }
        if let Some(v) = forecast_days {
            self.weather.show_forecast_days = v;
        }
        if let Some(v) = patch.network_show_bandwidth {
            self.network.show_bandwidth = v;
        }
        if let Some(v) = patch.network_show_devices {
            self.network.show_devices = v;
        }
        Ok(())
    }

    /// Replaces all holdings; the symbol list is rebuilt from them.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSymbol`] if any holding has a blank symbol.
    pub fn set_holdings(&mut self, holdings: Vec<Holding>) -> Result<(), ConfigError> {
        let holdings = holdings
            .into_iter()
            .map(|h| {
                Ok(Holding {
                    symbol: normalize_symbol(&h.symbol)?,
                    ..h
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        let mut symbols: Vec<String> = Vec::with_capacity(holdings.len());
        for h in &holdings {
            if !symbols.contains(&h.symbol) {
                symbols.push(h.symbol.clone());
            }
        }
        self.portfolio.holdings = holdings;
        self.portfolio.symbols = symbols;
        Ok(())
    }

    /// Adds a holding, or replaces the one with the same symbol.
    ///
    /// A newly added symbol is also appended to the tracked symbol list.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSymbol`] for a blank symbol.
    pub fn upsert_holding(&mut self, holding: Holding) -> Result<(), ConfigError> {
        let holding = Holding {
            symbol: normalize_symbol(&holding.symbol)?,
            ..holding
        };

        if let Some(existing) = self
            .portfolio
            .holdings
            .iter_mut()
            .find(|h| h.symbol == holding.symbol)
        {
            *existing = holding;
            return Ok(());
        }

        if !self.portfolio.symbols.contains(&holding.symbol) {
            self.portfolio.symbols.push(holding.symbol.clone());
        }
        self.portfolio.holdings.push(holding);
        Ok(())
    }

    /// Removes a holding and its symbol, matching case-insensitively.
    ///
    /// Returns `true` when anything changed.
    pub fn remove_holding(&mut self, raw: &str) -> bool {
        let symbol = raw.trim().to_uppercase();
        let before = self.portfolio.holdings.len();
        self.portfolio.holdings.retain(|h| h.symbol != symbol);
        let removed_holding = self.portfolio.holdings.len() != before;
        let removed_symbol = self.remove_symbol(&symbol);
        removed_holding || removed_symbol
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
