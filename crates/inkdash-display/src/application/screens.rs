//! Screens and screen navigation.
//!
//! A [`Screen`] is a named stack of widgets sharing the canvas in equal
//! horizontal strips.  The [`ScreenManager`] holds every screen and knows
//! which one is showing.  In single-screen mode the dashboard simply builds a
//! manager with one screen holding every enabled widget.

use inkdash_core::domain::layout::{screen_indicator_dots, separator_rows, split_rows};
use inkdash_core::Bounds;
use tracing::{debug, warn};

use super::canvas::{Canvas, RectStyle};
use super::widget::Widget;

/// A named group of widgets drawn together.
pub struct Screen {
    name: String,
    widgets: Vec<Box<dyn Widget>>,
}

impl Screen {
    pub fn new(name: impl Into<String>, widgets: Vec<Box<dyn Widget>>) -> Self {
        Self {
            name: name.into(),
            widgets,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Consumes the screen, handing back its widgets in order.
    pub fn into_widgets(self) -> Vec<Box<dyn Widget>> {
        self.widgets
    }

    pub fn widget_names(&self) -> Vec<&'static str> {
        self.widgets.iter().map(|w| w.name()).collect()
    }

    /// `true` when any widget on this screen shows the time of day.
    pub fn shows_time(&self) -> bool {
        self.widgets.iter().any(|w| w.shows_time())
    }

    /// Refreshes every widget.  A failing widget is logged and skipped; the
    /// others still update.  Returns how many widgets loaded new data.
    pub async fn update_all(&mut self) -> usize {
        let mut updated = 0;
        for widget in &mut self.widgets {
            match widget.update().await {
                Ok(true) => updated += 1,
                Ok(false) => debug!(widget = widget.name(), "nothing to update"),
                Err(e) => warn!("widget update failed, keeping previous data: {e}"),
            }
        }
        updated
    }

    /// Refreshes only the widgets that show the time.
    pub async fn update_time_widgets(&mut self) {
        for widget in self.widgets.iter_mut().filter(|w| w.shows_time()) {
            if let Err(e) = widget.update().await {
                warn!("clock update failed: {e}");
            }
        }
    }

    /// Draws every widget into its strip of `area`, with a one-pixel
    /// separator between strips.
    pub fn render(&self, canvas: &mut Canvas<'_>, area: Bounds) {
        let rows = split_rows(area, self.widgets.len());
        for (widget, bounds) in self.widgets.iter().zip(rows) {
            widget.render(canvas, bounds);
        }
        for y in separator_rows(area, self.widgets.len()) {
            canvas.hline(y, area.x, area.right() - 1);
        }
    }
}

/// Ordered collection of screens with a cursor on the current one.
#[derive(Default)]
pub struct ScreenManager {
    screens: Vec<Screen>,
    current: usize,
}

impl ScreenManager {
    pub fn new(screens: Vec<Screen>) -> Self {
        Self { screens, current: 0 }
    }

    pub fn len(&self) -> usize {
        self.screens.len()
    }

    /// Consumes the manager, handing back every widget of every screen.
    pub fn into_widgets(self) -> Vec<Box<dyn Widget>> {
        self.screens.into_iter().flat_map(Screen::into_widgets).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.screens.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> Option<&Screen> {
        self.screens.get(self.current)
    }

    pub fn current_mut(&mut self) -> Option<&mut Screen> {
        self.screens.get_mut(self.current)
    }

    /// Advances to the next screen, wrapping to the first.
    pub fn next(&mut self) {
        if !self.screens.is_empty() {
            self.current = (self.current + 1) % self.screens.len();
        }
    }

    /// Steps back to the previous screen, wrapping to the last.
    pub fn previous(&mut self) {
        if !self.screens.is_empty() {
            self.current = (self.current + self.screens.len() - 1) % self.screens.len();
        }
    }

    /// Jumps to `index`; out-of-range indices are ignored.
    pub fn go_to(&mut self, index: usize) {
        if index < self.screens.len() {
            self.current = index;
        }
    }

    /// Jumps to the screen named `name`, keeping the position when absent.
    pub fn go_to_named(&mut self, name: &str) {
        if let Some(idx) = self.screens.iter().position(|s| s.name == name) {
            self.current = idx;
        }
    }

    /// Draws the current screen, plus indicator dots when there is more than
    /// one screen.
    pub fn render(&self, canvas: &mut Canvas<'_>) {
        let Some(screen) = self.current() else {
            return;
        };
        let (width, height) = (canvas.width(), canvas.height());
        screen.render(canvas, Bounds::full(width, height));

        for dot in screen_indicator_dots(width, height, self.screens.len(), self.current) {
            let style = if dot.filled {
                RectStyle::Filled
            } else {
                RectStyle::Outline
            };
            canvas.draw_rect(dot.bounds, style);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::widget::WidgetError;
    use async_trait::async_trait;
    use inkdash_core::Frame;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    // ── Test widget ───────────────────────────────────────────────────────────

    /// Fills its bounds solid black; optionally fails every update.
    struct BlockWidget {
        fail: bool,
        updates: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Widget for BlockWidget {
        fn name(&self) -> &'static str {
            "block"
        }

        async fn update(&mut self) -> Result<bool, WidgetError> {
            self.updates.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(WidgetError::NoData { widget: "block" })
            } else {
                Ok(true)
            }
        }

        fn render(&self, canvas: &mut Canvas<'_>, bounds: Bounds) {
            canvas.draw_rect(bounds, RectStyle::Filled);
        }
    }

    fn block(fail: bool, counter: &Arc<AtomicUsize>) -> Box<dyn Widget> {
        Box::new(BlockWidget {
            fail,
            updates: Arc::clone(counter),
        })
    }

    fn manager_with(n: usize) -> ScreenManager {
        let counter = Arc::new(AtomicUsize::new(0));
        ScreenManager::new(
            (0..n)
                .map(|i| Screen::new(format!("s{i}"), vec![block(false, &counter)]))
                .collect(),
        )
    }

    // ── Navigation ────────────────────────────────────────────────────────────

    #[test]
    fn test_next_wraps_to_first() {
        let mut m = manager_with(3);
        m.next();
        m.next();
        m.next();
        assert_eq!(m.current_index(), 0);
    }

    #[test]
    fn test_previous_wraps_to_last() {
        let mut m = manager_with(3);
        m.previous();
        assert_eq!(m.current_index(), 2);
    }

    #[test]
    fn test_go_to_out_of_range_is_ignored() {
        let mut m = manager_with(2);
        m.go_to(1);
        m.go_to(5);
        assert_eq!(m.current_index(), 1);
    }

    #[test]
    fn test_go_to_named_finds_screen() {
        let mut m = manager_with(3);
        m.go_to_named("s2");
        assert_eq!(m.current().map(|s| s.name()), Some("s2"));
        m.go_to_named("missing");
        assert_eq!(m.current_index(), 2);
    }

    #[test]
    fn test_navigation_on_empty_manager_is_noop() {
        let mut m = ScreenManager::default();
        m.next();
        m.previous();
        assert!(m.current().is_none());
    }

    // ── Updating ──────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_update_all_continues_past_failing_widget() {
        // Arrange
        let counter = Arc::new(AtomicUsize::new(0));
        let mut screen = Screen::new(
            "mixed",
            vec![block(true, &counter), block(false, &counter), block(false, &counter)],
        );

        // Act
        let updated = screen.update_all().await;

        // Assert
        assert_eq!(updated, 2);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    // ── Rendering ─────────────────────────────────────────────────────────────

    #[test]
    fn test_screen_render_splits_into_strips() {
        // Arrange: two solid widgets on a 20×10 canvas
        let counter = Arc::new(AtomicUsize::new(0));
        let screen = Screen::new("two", vec![block(false, &counter), block(false, &counter)]);
        let mut frame = Frame::new(20, 11);

        // Act
        screen.render(&mut Canvas::new(&mut frame), Bounds::full(20, 11));

        // Assert: strips are 5 rows each, the 11th row stays blank
        assert_eq!(frame.count_black_in(Bounds::new(0, 0, 20, 10)), 200);
        assert_eq!(frame.count_black_in(Bounds::new(0, 10, 20, 1)), 0);
    }

    #[test]
    fn test_manager_render_draws_indicators_only_for_multiple_screens() {
        // Arrange: screens with no widgets so only indicators draw
        let single = ScreenManager::new(vec![Screen::new("a", Vec::new())]);
        let multi = ScreenManager::new(vec![
            Screen::new("a", Vec::new()),
            Screen::new("b", Vec::new()),
        ]);
        let mut f1 = Frame::new(250, 122);
        let mut f2 = Frame::new(250, 122);

        // Act
        single.render(&mut Canvas::new(&mut f1));
        multi.render(&mut Canvas::new(&mut f2));

        // Assert: one filled 3×3 dot (9) + one outlined 3×3 dot (8)
        assert_eq!(f1.count_black(), 0);
        assert_eq!(f2.count_black(), 17);
    }
}
