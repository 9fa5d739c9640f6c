//! Recording panel for tests.
//!
//! `MockPanel` keeps every call, and a copy of every frame it was shown, in a
//! shared log.  Clone the log handle before boxing the panel into a
//! [`DisplayDriver`](crate::application::display::DisplayDriver):
//!
//! ```ignore
//! let panel = MockPanel::new();
//! let calls = panel.calls();
//! let driver = DisplayDriver::new(Box::new(panel), 250, 122);
//! // … run the dashboard …
//! assert_eq!(calls.lock().unwrap().len(), 2);
//! ```

use std::sync::{Arc, Mutex, PoisonError};

use inkdash_core::Frame;

use crate::application::display::{DisplayError, Panel, RefreshMode};

#[derive(Debug, Clone, PartialEq)]
pub enum PanelCall {
    Init(RefreshMode),
    Display(RefreshMode, Frame),
    Clear,
    Sleep,
}

#[derive(Default)]
pub struct MockPanel {
    calls: Arc<Mutex<Vec<PanelCall>>>,
    /// When `true`, `display` fails with an I/O error.
    pub should_fail: bool,
}

impl MockPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle to the call log.
    pub fn calls(&self) -> Arc<Mutex<Vec<PanelCall>>> {
        Arc::clone(&self.calls)
    }

    fn record(&self, call: PanelCall) {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).push(call);
    }
}

impl Panel for MockPanel {
    fn init(&mut self, mode: RefreshMode) -> Result<(), DisplayError> {
        self.record(PanelCall::Init(mode));
        Ok(())
    }

    fn display(&mut self, frame: &Frame, mode: RefreshMode) -> Result<(), DisplayError> {
        if self.should_fail {
            return Err(DisplayError::Io {
                path: "mock".into(),
                source: std::io::Error::other("mock failure"),
            });
        }
        self.record(PanelCall::Display(mode, frame.clone()));
        Ok(())
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        self.record(PanelCall::Clear);
        Ok(())
    }

    fn sleep(&mut self) -> Result<(), DisplayError> {
        self.record(PanelCall::Sleep);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::display::DisplayDriver;

    #[test]
    fn test_driver_calls_are_recorded_in_order() {
        // Arrange
        let panel = MockPanel::new();
        let calls = panel.calls();
        let mut driver = DisplayDriver::new(Box::new(panel), 4, 4);

        // Act
        driver.show(&Frame::new(4, 4), RefreshMode::Full).unwrap();
        driver.clear().unwrap();
        driver.sleep().unwrap();

        // Assert
        assert_eq!(
            *calls.lock().unwrap(),
            vec![
                PanelCall::Init(RefreshMode::Full),
                PanelCall::Display(RefreshMode::Full, Frame::new(4, 4)),
                PanelCall::Clear,
                PanelCall::Sleep,
            ]
        );
    }

    #[test]
    fn test_failing_panel_surfaces_io_error() {
        let mut panel = MockPanel::new();
        panel.should_fail = true;
        let mut driver = DisplayDriver::new(Box::new(panel), 4, 4);
        assert!(matches!(driver.show(&Frame::new(4, 4), RefreshMode::Full), Err(DisplayError::Io { .. })));
    }
}
