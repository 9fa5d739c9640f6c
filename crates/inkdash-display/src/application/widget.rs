//! The widget contract.
//!
//! A widget owns the data it shows.  `update` refreshes that data from its
//! source (network, `/proc`, the system clock); `render` draws whatever data
//! the widget currently holds into the strip of the screen it was given.
//!
//! A failed `update` must leave the previous data in place, so the next
//! `render` still shows the last good values instead of an empty box.

use async_trait::async_trait;
use inkdash_core::Bounds;
use thiserror::Error;

use super::canvas::Canvas;

/// Errors a widget may report from [`Widget::update`].
///
/// These are logged by the caller and never stop a refresh cycle.
#[derive(Debug, Error)]
pub enum WidgetError {
    /// The upstream data source failed (HTTP error, unreadable file, …).
    #[error("{widget}: data source failed: {message}")]
    Source {
        widget: &'static str,
        message: String,
    },

    /// The source answered but had nothing usable for this widget.
    #[error("{widget}: no data available")]
    NoData { widget: &'static str },
}

/// A dashboard panel that can refresh its data and draw itself.
#[async_trait]
pub trait Widget: Send {
    /// Short configuration name, e.g. `"weather"`.
    fn name(&self) -> &'static str;

    /// Refreshes the widget's data.
    ///
    /// Returns `Ok(true)` when new data was loaded and `Ok(false)` when there
    /// was nothing to do (e.g. no symbols configured).
    ///
    /// # Errors
    ///
    /// Returns [`WidgetError`] when the data source fails.  The widget must
    /// keep its previous data in that case.
    async fn update(&mut self) -> Result<bool, WidgetError>;

    /// Draws the widget's current data inside `bounds`.
    fn render(&self, canvas: &mut Canvas<'_>, bounds: Bounds);

    /// `true` for widgets showing the time of day, which get a partial
    /// redraw on every clock tick between full refreshes.
    fn shows_time(&self) -> bool {
        false
    }
}
