//! Open-Meteo forecast client.
//!
//! Open-Meteo needs no API key.  One request returns the current temperature
//! and weather code plus daily highs, lows, and codes for the requested number
//! of days, with dates in the location's own time zone (`timezone=auto`).

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use tokio::time::sleep;
use tracing::{debug, warn};

use super::{http_client, DailyForecast, SourceError, WeatherQuery, WeatherReport, WeatherSource};

const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";
const MAX_ATTEMPTS: u32 = 3;
const INITIAL_BACKOFF: Duration = Duration::from_secs(2);

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: CurrentBlock,
    daily: DailyBlock,
}

#[derive(Debug, Deserialize)]
struct CurrentBlock {
    temperature_2m: f64,
    weather_code: u16,
}

#[derive(Debug, Deserialize)]
struct DailyBlock {
    time: Vec<NaiveDate>,
    temperature_2m_max: Vec<f64>,
    temperature_2m_min: Vec<f64>,
    weather_code: Vec<u16>,
}

impl ForecastResponse {
    /// Zips the parallel daily arrays, keeping at most `days` entries.
    fn into_report(self, days: u32) -> Result<WeatherReport, SourceError> {
        let d = self.daily;
        let n = d.time.len();
        if d.temperature_2m_max.len() != n || d.temperature_2m_min.len() != n || d.weather_code.len() != n {
            return Err(SourceError::BadResponse(
                "daily arrays have different lengths".to_string(),
            ));
        }
        let daily = d
            .time
            .into_iter()
            .zip(d.temperature_2m_max)
            .zip(d.temperature_2m_min)
            .zip(d.weather_code)
            .take(days as usize)
            .map(|(((date, high), low), code)| DailyForecast {
                date,
                high,
                low,
                code,
            })
            .collect();
        Ok(WeatherReport {
            current_temp: self.current.temperature_2m,
            current_code: self.current.weather_code,
            daily,
        })
    }
}

/// [`WeatherSource`] backed by the public Open-Meteo API.
pub struct OpenMeteoSource {
    client: reqwest::Client,
    base_url: String,
    initial_backoff: Duration,
}

impl OpenMeteoSource {
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the HTTP client cannot be built.
    pub fn new() -> Result<Self, SourceError> {
        Ok(Self {
            client: http_client()?,
            base_url: FORECAST_URL.to_string(),
            initial_backoff: INITIAL_BACKOFF,
        })
    }

    async fn fetch_once(&self, query: &WeatherQuery) -> Result<WeatherReport, SourceError> {
        let params = [
            ("latitude", query.latitude.to_string()),
            ("longitude", query.longitude.to_string()),
            ("current", "temperature_2m,weather_code".to_string()),
            (
                "daily",
                "temperature_2m_max,temperature_2m_min,weather_code".to_string(),
            ),
            ("temperature_unit", query.units.as_str().to_string()),
            ("timezone", "auto".to_string()),
            ("forecast_days", query.days.to_string()),
        ];
        let response: ForecastResponse = self
            .client
            .get(&self.base_url)
            .query(&params)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        response.into_report(query.days)
    }
}

#[async_trait]
impl WeatherSource for OpenMeteoSource {
    /// Fetches with up to three attempts, doubling the pause between them.
    async fn forecast(&self, query: &WeatherQuery) -> Result<WeatherReport, SourceError> {
        let mut backoff = self.initial_backoff;
        let mut attempt = 1;
        loop {
            match self.fetch_once(query).await {
                Ok(report) => {
                    debug!(temp = report.current_temp, code = report.current_code, "weather fetched");
                    return Ok(report);
                }
                Err(e) if attempt < MAX_ATTEMPTS => {
                    warn!("weather fetch attempt {attempt}/{MAX_ATTEMPTS} failed: {e}");
                    sleep(backoff).await;
                    backoff *= 2;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkdash_core::TemperatureUnit;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const SAMPLE: &str = r#"{
        "latitude": 40.71, "longitude": -74.0,
        "current": {"time": "2024-01-05T14:00", "temperature_2m": 41.6, "weather_code": 3},
        "daily": {
            "time": ["2024-01-05", "2024-01-06", "2024-01-07"],
            "temperature_2m_max": [44.1, 39.0, 35.5],
            "temperature_2m_min": [33.2, 30.1, 28.9],
            "weather_code": [3, 61, 71]
        }
    }"#;

    #[test]
    fn test_response_maps_to_report() {
        // Arrange
        let response: ForecastResponse = serde_json::from_str(SAMPLE).unwrap();

        // Act
        let report = response.into_report(3).unwrap();

        // Assert
        assert_eq!(report.current_temp, 41.6);
        assert_eq!(report.current_code, 3);
        assert_eq!(report.daily.len(), 3);
        assert_eq!(report.daily[1].date, NaiveDate::from_ymd_opt(2024, 1, 6).unwrap());
        assert_eq!(report.daily[2].code, 71);
    }

    #[test]
    fn test_report_is_cut_to_requested_days() {
        let response: ForecastResponse = serde_json::from_str(SAMPLE).unwrap();
        let report = response.into_report(2).unwrap();
        assert_eq!(report.daily.len(), 2);
    }

    #[test]
    fn test_ragged_daily_arrays_are_rejected() {
        let json = SAMPLE.replace("[3, 61, 71]", "[3, 61]");
        let response: ForecastResponse = serde_json::from_str(&json).unwrap();
        assert!(matches!(response.into_report(3), Err(SourceError::BadResponse(_))));
    }

    #[tokio::test]
    async fn test_unreachable_host_fails_after_retries() {
        // Arrange: nothing listens on port 9 of the loopback interface
        let source = OpenMeteoSource {
            client: http_client().unwrap(),
            base_url: "http://127.0.0.1:9/v1/forecast".to_string(),
            initial_backoff: Duration::from_millis(1),
        };
        let query = WeatherQuery {
            latitude: 1.0,
            longitude: 2.0,
            units: TemperatureUnit::Celsius,
            days: 3,
        };

        // Act
        let result = source.forecast(&query).await;

        // Assert
        assert!(matches!(result, Err(SourceError::Http(_))));
    }

    /// Serves `failures` 503 responses, then `SAMPLE`, one connection per
    /// request.  Returns the base URL and the number of requests seen.
    async fn flaky_server(failures: usize) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let mut buf = [0u8; 4096];
                let _ = stream.read(&mut buf).await;
                let n = counter.fetch_add(1, Ordering::SeqCst);
                let reply = if n < failures {
                    "HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_string()
                } else {
                    format!(
                        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{SAMPLE}",
                        SAMPLE.len()
                    )
                };
                let _ = stream.write_all(reply.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });
        (format!("http://{addr}/v1/forecast"), seen)
    }

    fn local_source(base_url: String) -> OpenMeteoSource {
        OpenMeteoSource {
            client: http_client().unwrap(),
            base_url,
            initial_backoff: Duration::from_millis(1),
        }
    }

    fn sample_query() -> WeatherQuery {
        WeatherQuery {
            latitude: 40.71,
            longitude: -74.0,
            units: TemperatureUnit::Fahrenheit,
            days: 3,
        }
    }

    #[tokio::test]
    async fn test_gives_up_after_three_attempts() {
        // Arrange
        let (url, seen) = flaky_server(usize::MAX).await;
        let source = local_source(url);

        // Act
        let result = source.forecast(&sample_query()).await;

        // Assert
        assert!(matches!(result, Err(SourceError::Http(_))));
        assert_eq!(seen.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_third_attempt_can_succeed() {
        let (url, seen) = flaky_server(2).await;
        let source = local_source(url);

        let report = source.forecast(&sample_query()).await.unwrap();

        assert_eq!(report.current_code, 3);
        assert_eq!(seen.load(Ordering::SeqCst), 3);
    }
}
