//! # inkdash-core
//!
//! Shared library for inkdash containing the configuration document, its
//! YAML persistence, the 1-bit frame buffer pushed to the e-paper panel, and
//! small layout and formatting helpers.
//!
//! This crate is used by both the display service and the web control panel.
//! It has no dependencies on HTTP clients, web frameworks, or display hardware.
//!
//! # Architecture overview (for beginners)
//!
//! inkdash is a Raspberry Pi dashboard: a polling loop fetches data for a few
//! widgets (clock, weather, portfolio, network) and draws them on a small
//! e-paper screen.  A separate web service lets you edit the settings from a
//! browser.  The two processes never talk to each other directly; they share
//! one YAML file.
//!
//! This crate (`inkdash-core`) is the shared foundation.  It defines:
//!
//! - **`domain`** – Pure logic with no I/O.  The configuration schema and the
//!   rules for changing it, the [`Frame`] bitmap, screen geometry, and the
//!   text formatting used by widgets.
//!
//! - **`storage`** – Reading and writing the YAML document on disk, with an
//!   async lock around read-modify-write so concurrent HTTP requests cannot
//!   lose each other's updates.

// Declare the two top-level modules.  Rust will look for each in a
// subdirectory with the same name (e.g., src/domain/mod.rs).
pub mod domain;
pub mod storage;

// Re-export the most-used types at the crate root so callers can write
// `inkdash_core::DashboardConfig` instead of `inkdash_core::domain::config::DashboardConfig`.
pub use domain::config::{
    ClockFormat, ConfigError, DashboardConfig, DisplayBackend, Holding, ScreenConfig,
    SettingsPatch, TemperatureUnit,
};
pub use domain::frame::{Frame, FrameError};
pub use domain::layout::Bounds;
pub use storage::config_store::{ConfigStore, StoreError};
