//! Application layer for the display service.
//!
//! # What lives here?
//!
//! - **`widget`** – The [`widget::Widget`] trait every dashboard panel
//!   implements: refresh data, then draw it.
//! - **`canvas`** – Text, lines, and shapes on top of the core `Frame`.
//! - **`screens`** – Grouping widgets into screens and moving between them.
//! - **`display`** – The `Panel` port and the `DisplayDriver` that enforces
//!   lazy initialisation and frame size.
//! - **`dashboard`** – The refresh cycle, clock ticks, config reload, and the
//!   polling loop.
//!
//! Nothing in this layer performs network or file I/O itself other than
//! re-reading the configuration through `inkdash-core`.  Concrete widgets,
//! data sources, and panel backends live in `infrastructure` and are injected
//! through the `WidgetFactory` and `Panel` traits.

pub mod canvas;
pub mod dashboard;
pub mod display;
pub mod screens;
pub mod widget;
