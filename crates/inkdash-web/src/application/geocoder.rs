//! Port for turning a ZIP code into coordinates.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::GeoLocation;

#[derive(Debug, Error)]
pub enum GeocodeError {
    /// Transport failure, timeout, or non-2xx status.
    #[error("geocoding request failed: {0}")]
    Request(String),

    /// The service answered with something we could not read.
    #[error("unexpected geocoder response: {0}")]
    BadResponse(String),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Looks up a five-digit US ZIP code.
    ///
    /// Returns `Ok(None)` when the service knows no such code.
    async fn locate(&self, zip: &str) -> Result<Option<GeoLocation>, GeocodeError>;
}
