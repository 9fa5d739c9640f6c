//! Storage: YAML configuration file persistence.
//!
//! The `config_store` sub-module handles:
//!
//! - Reading the YAML document, falling back to defaults when the file does
//!   not exist yet (first run).
//! - Writing it back atomically (temp file + rename) so the display service
//!   never reads a half-written file.
//! - Serializing read-modify-write cycles from the web panel behind an async
//!   lock so two concurrent requests cannot lose each other's changes.

pub mod config_store;
