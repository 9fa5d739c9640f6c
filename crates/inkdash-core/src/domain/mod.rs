//! Domain types for inkdash.
//!
//! This module contains pure logic with no infrastructure dependencies: no
//! file I/O, no sockets, no clocks.  Everything here can be unit-tested on a
//! laptop without a Raspberry Pi attached.
//!
//! # What lives here?
//!
//! - [`config`] – the configuration document and the validated mutations the
//!   web panel applies to it.
//! - [`frame`] – the 1-bit bitmap that widgets draw into and the display
//!   driver pushes to the panel.
//! - [`layout`] – rectangles and the arithmetic for splitting the screen
//!   between widgets.
//! - [`format`] – human-readable numbers (bytes, speeds, prices).
//! - [`weather`] – WMO weather-code descriptions.

pub mod config;
pub mod format;
pub mod frame;
pub mod layout;
pub mod weather;
