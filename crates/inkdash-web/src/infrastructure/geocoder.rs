//! ZIP code lookups.
//!
//! [`NominatimGeocoder`] asks OpenStreetMap's Nominatim service, which needs
//! no API key but asks for an identifying User-Agent and at most one request
//! per second.  The panel only geocodes when a user saves a new ZIP code, so
//! no client-side throttling is done.
//!
//! [`StaticGeocoder`] answers from a fixed table and is used by tests and for
//! running the panel offline.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use crate::application::{GeocodeError, Geocoder};
use crate::domain::GeoLocation;

const SEARCH_URL: &str = "https://nominatim.openstreetmap.org/search";
const TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = concat!("inkdash/", env!("CARGO_PKG_VERSION"));

/// One search hit.  Nominatim returns coordinates as strings.
#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: String,
}

fn parse_places(zip: &str, places: Vec<Place>) -> Result<Option<GeoLocation>, GeocodeError> {
    let Some(place) = places.into_iter().next() else {
        return Ok(None);
    };
    let coord = |raw: &str| {
        raw.trim()
            .parse::<f64>()
            .map_err(|_| GeocodeError::BadResponse(format!("bad coordinate {raw:?}")))
    };
    Ok(Some(GeoLocation::from_display_name(
        zip,
        coord(&place.lat)?,
        coord(&place.lon)?,
        &place.display_name,
    )))
}

pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
}

impl NominatimGeocoder {
    /// # Errors
    ///
    /// Returns [`GeocodeError::Request`] if the HTTP client cannot be built.
    pub fn new() -> Result<Self, GeocodeError> {
        Self::with_base_url(SEARCH_URL)
    }

    /// Points the client at another Nominatim instance.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder()
            .timeout(TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| GeocodeError::Request(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn locate(&self, zip: &str) -> Result<Option<GeoLocation>, GeocodeError> {
        let request_failed = |e: reqwest::Error| GeocodeError::Request(e.to_string());
        let places: Vec<Place> = self
            .client
            .get(&self.base_url)
            .query(&[
                ("postalcode", zip),
                ("country", "US"),
                ("format", "json"),
                ("limit", "1"),
            ])
            .send()
            .await
            .map_err(request_failed)?
            .error_for_status()
            .map_err(request_failed)?
            .json()
            .await
            .map_err(|e| GeocodeError::BadResponse(e.to_string()))?;

        let location = parse_places(zip, places)?;
        match &location {
            Some(loc) => info!("geocoded {zip} -> {}, {} ({})", loc.latitude, loc.longitude, loc.city),
            None => debug!("no geocoding results for {zip}"),
        }
        Ok(location)
    }
}

/// Answers from an in-memory table; unknown codes are not found.
#[derive(Default)]
pub struct StaticGeocoder {
    places: HashMap<String, GeoLocation>,
    lookups: AtomicUsize,
}

impl StaticGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_place(mut self, zip: &str, latitude: f64, longitude: f64, city: &str) -> Self {
        self.places.insert(
            zip.to_string(),
            GeoLocation {
                latitude,
                longitude,
                city: city.to_string(),
            },
        );
        self
    }

    /// Number of `locate` calls so far.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Geocoder for StaticGeocoder {
    async fn locate(&self, zip: &str) -> Result<Option<GeoLocation>, GeocodeError> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        Ok(self.places.get(zip).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(lat: &str, lon: &str, name: &str) -> Place {
        Place {
            lat: lat.to_string(),
            lon: lon.to_string(),
            display_name: name.to_string(),
        }
    }

    #[test]
    fn test_parse_first_place() {
        // Arrange
        let body = r#"[{"place_id": 1, "lat": "40.7484", "lon": "-73.9967",
                        "display_name": "Manhattan, New York County, New York, 10001, United States"}]"#;
        let places: Vec<Place> = serde_json::from_str(body).unwrap();

        // Act
        let loc = parse_places("10001", places).unwrap().unwrap();

        // Assert
        assert_eq!(loc.city, "Manhattan");
        assert_eq!(loc.latitude, 40.7484);
        assert_eq!(loc.longitude, -73.9967);
    }

    #[test]
    fn test_no_places_is_not_found() {
        assert_eq!(parse_places("99999", Vec::new()).unwrap(), None);
    }

    #[test]
    fn test_bad_coordinate_is_bad_response() {
        let result = parse_places("10001", vec![place("north", "-73.9", "X")]);
        assert!(matches!(result, Err(GeocodeError::BadResponse(_))));
    }

    #[tokio::test]
    async fn test_static_geocoder_counts_lookups() {
        let geocoder = StaticGeocoder::new().with_place("10001", 40.75, -73.99, "New York");

        assert!(geocoder.locate("10001").await.unwrap().is_some());
        assert!(geocoder.locate("20002").await.unwrap().is_none());
        assert_eq!(geocoder.lookups(), 2);
    }
}
