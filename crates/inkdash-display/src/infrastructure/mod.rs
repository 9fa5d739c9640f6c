//! Infrastructure layer for the display service.
//!
//! Contains the adapters that touch the outside world: HTTP and `/proc` data
//! sources, the on-disk response cache, the concrete widgets built on them,
//! and the panel backends.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `inkdash_core`, but MUST NOT be imported by the `application` layer.

pub mod api_cache;
pub mod panel;
pub mod sources;
pub mod widgets;
