//! inkdash-web library crate.
//!
//! A small REST API for editing the dashboard configuration from a browser on
//! the local network.  It shares the YAML file with the display service and
//! never talks to it directly.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! Browser (JSON over HTTP)
//!         ↕
//! [inkdash-web]
//!   ├── domain/           Request/response bodies, GeoLocation
//!   ├── application/      ConfigService, Geocoder port
//!   └── infrastructure/
//!         ├── http_server  axum router, ApiError → {"error": ...}
//!         └── geocoder     Nominatim client
//!         ↕
//! config.yaml (inkdash-core ConfigStore)
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O.
//! - `application` depends on `domain` and `inkdash-core` only.
//! - `infrastructure` depends on all other layers plus `axum` and `reqwest`.

/// Domain layer: pure types (no I/O).
pub mod domain;

/// Application layer: endpoint operations over the configuration store.
pub mod application;

/// Infrastructure layer: HTTP server and geocoding client.
pub mod infrastructure;
