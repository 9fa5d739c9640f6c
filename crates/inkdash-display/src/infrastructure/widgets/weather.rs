//! Current conditions on the left, the next days' forecast on the right.

use std::sync::Arc;

use async_trait::async_trait;
use inkdash_core::domain::config::WeatherConfig;
use inkdash_core::domain::format::truncate;
use inkdash_core::domain::weather::weather_description;
use inkdash_core::Bounds;
use tracing::info;

use super::source_failed;
use crate::application::canvas::{Anchor, Canvas, FontSize};
use crate::application::widget::{Widget, WidgetError};
use crate::infrastructure::api_cache::{ApiCache, WEATHER_TTL};
use crate::infrastructure::sources::{WeatherQuery, WeatherReport, WeatherSource};

const NAME: &str = "weather";

pub struct WeatherWidget {
    config: WeatherConfig,
    source: Arc<dyn WeatherSource>,
    cache: Arc<ApiCache>,
    report: Option<WeatherReport>,
}

impl WeatherWidget {
    pub fn new(config: &WeatherConfig, source: Arc<dyn WeatherSource>, cache: Arc<ApiCache>) -> Self {
        Self {
            config: config.clone(),
            source,
            cache,
            report: None,
        }
    }

    pub fn report(&self) -> Option<&WeatherReport> {
        self.report.as_ref()
    }

    fn query(&self) -> WeatherQuery {
        WeatherQuery {
            latitude: self.config.latitude,
            longitude: self.config.longitude,
            units: self.config.units,
            days: self.config.show_forecast_days.clamp(1, 7),
        }
    }

    /// Every query parameter is part of the key so a changed location or
    /// unit never reads a stale entry.
    fn cache_key(query: &WeatherQuery) -> String {
        format!(
            "weather_{}_{}_{}_{}",
            query.latitude,
            query.longitude,
            query.units.as_str(),
            query.days
        )
    }

    /// City (text before the first comma, at most 15 characters), else the
    /// ZIP code, else `Weather`.
    pub fn location_display(&self) -> String {
        if let Some(name) = self.config.location_name.as_deref().filter(|n| !n.is_empty()) {
            let city = name.split(',').next().unwrap_or(name).trim();
            return truncate(city, 15).to_string();
        }
        match &self.config.zip_code {
            Some(zip) if !zip.is_empty() => zip.clone(),
            _ => "Weather".to_string(),
        }
    }

    fn render_current(&self, canvas: &mut Canvas<'_>, area: Bounds) {
        let cx = area.center_x();
        let h = area.height as i32;
        let unit = self.config.units.symbol();

        canvas.draw_text(&self.location_display(), cx, area.y + 8, FontSize::Small, true, Anchor::Center);
        if let Some(zip) = self.config.zip_code.as_deref().filter(|z| !z.is_empty()) {
            canvas.draw_text(zip, cx, area.y + 20, FontSize::Tiny, false, Anchor::Center);
        }

        let (temp, condition) = match &self.report {
            Some(r) => (
                format!("{}{unit}", r.current_temp.round() as i64),
                weather_description(r.current_code).to_string(),
            ),
            None => (format!("--{unit}"), "Unavailable".to_string()),
        };
        let temp_y = area.y + h / 2;
        canvas.draw_text(&temp, cx, temp_y, FontSize::Huge, true, Anchor::Center);
        canvas.draw_text(&condition, cx, temp_y + 16, FontSize::Small, false, Anchor::Center);

        if let Some(today) = self.report.as_ref().and_then(|r| r.daily.first()) {
            let hilo = format!(
                "H:{}° L:{}°",
                today.high.round() as i64,
                today.low.round() as i64
            );
            canvas.draw_text(&hilo, cx, area.bottom() - 7, FontSize::Small, true, Anchor::Center);
        }
    }

    fn render_forecast(&self, canvas: &mut Canvas<'_>, area: Bounds) {
        let Some(report) = &self.report else {
            return;
        };
        let upcoming = report.daily.get(1..).unwrap_or_default();
        if upcoming.is_empty() {
            return;
        }
        let x = area.x + 5;
        let line_height = (area.height.saturating_sub(12) / upcoming.len() as u32) as i32;
        for (i, day) in upcoming.iter().enumerate() {
            let y = area.y + 6 + i as i32 * line_height;
            let name = day.date.format("%a").to_string();
            let temps = format!("{}/{}°", day.high.round() as i64, day.low.round() as i64);
            let condition = weather_description(day.code);
            canvas.draw_text(&name, x, y, FontSize::Small, true, Anchor::TopLeft);
            canvas.draw_text(&temps, x + 30, y, FontSize::Small, false, Anchor::TopLeft);
            canvas.draw_text(truncate(condition, 8), x + 70, y + 1, FontSize::Tiny, false, Anchor::TopLeft);
        }
    }
}

#[async_trait]
impl Widget for WeatherWidget {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn update(&mut self) -> Result<bool, WidgetError> {
        let query = self.query();
        let key = Self::cache_key(&query);
        let source = Arc::clone(&self.source);
        let report = self
            .cache
            .get_or_fetch(&key, WEATHER_TTL, move || async move { source.forecast(&query).await })
            .await
            .map_err(source_failed(NAME))?;
        info!(
            "weather updated: {}{} {}",
            report.current_temp.round() as i64,
            self.config.units.symbol(),
            weather_description(report.current_code)
        );
        self.report = Some(report);
        Ok(true)
    }

    fn render(&self, canvas: &mut Canvas<'_>, bounds: Bounds) {
        let left = bounds.left_half();
        self.render_current(canvas, left);
        canvas.vline(left.right(), bounds.y, bounds.bottom() - 1);
        self.render_forecast(canvas, bounds.right_half());
    }
}
