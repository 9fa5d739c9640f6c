//! Domain layer for inkdash-web.
//!
//! Pure types with no I/O: the JSON bodies the browser sends and receives,
//! and the result of a ZIP code lookup.
//!
//! # What belongs in the domain layer?
//!
//! - Request and response bodies of the REST API
//! - The rules that turn a loosely-typed request body into typed values
//!   ("Missing symbol", "symbols must be a list", ...)
//! - The geocoding result type
//!
//! # What does NOT belong here?
//!
//! - axum extractors or HTTP status codes
//! - Reading or writing the configuration file
//! - Outbound HTTP requests

pub mod location;
pub mod messages;

pub use location::GeoLocation;
pub use messages::RequestError;
