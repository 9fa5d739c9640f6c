//! Application layer for inkdash-web.
//!
//! Knows *what* each endpoint does to the configuration but not how requests
//! arrive or how ZIP codes are looked up.
//!
//! # Responsibilities
//!
//! - Applying each REST operation to the configuration file via
//!   [`inkdash_core::ConfigStore`]
//! - Defining the [`Geocoder`] port and the [`ServiceError`] type
//!
//! # What does NOT belong here?
//!
//! - Routing, extractors, status codes (infrastructure)
//! - The Nominatim HTTP client (infrastructure)

pub mod config_service;
pub mod geocoder;

pub use config_service::{ConfigService, ServiceError};
pub use geocoder::{GeocodeError, Geocoder};
