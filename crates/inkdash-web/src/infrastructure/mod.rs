//! Infrastructure layer for inkdash-web.
//!
//! Everything that touches the network: the axum HTTP server that browsers
//! talk to and the Nominatim client used to geocode ZIP codes.
//!
//! # What does NOT belong here?
//!
//! - Configuration rules (those live in `inkdash-core`)
//! - Deciding what an endpoint changes (that is the application layer)

pub mod geocoder;
pub mod http_server;

pub use geocoder::{NominatimGeocoder, StaticGeocoder};
pub use http_server::{router, run_server, ApiError};
