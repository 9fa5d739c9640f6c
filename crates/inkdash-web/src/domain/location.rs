//! Geocoding result.

use serde::{Deserialize, Serialize};

/// Coordinates and a display name for a US ZIP code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
    /// Short place name, e.g. `"Brooklyn"`.
    pub city: String,
}

impl GeoLocation {
    /// Builds a location from a geocoder `display_name`.
    ///
    /// The city is the text before the first comma
    /// (`"Beverly Hills, Los Angeles County, California, 90210, United States"`
    /// → `"Beverly Hills"`).  An empty name falls back to `"ZIP <zip>"`.
    pub fn from_display_name(zip: &str, latitude: f64, longitude: f64, display_name: &str) -> Self {
        let city = display_name.split(',').next().unwrap_or_default().trim();
        let city = if city.is_empty() {
            format!("ZIP {zip}")
        } else {
            city.to_string()
        };
        Self {
            latitude,
            longitude,
            city,
        }
    }
}
