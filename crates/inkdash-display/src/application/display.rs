//! Display driver: the port between rendered frames and a panel backend.
//!
//! [`Panel`] is the trait a backend implements (a file-writing simulator, a
//! raw device writer, or a test double).  [`DisplayDriver`] adds the rules
//! every backend shares:
//!
//! - the panel is initialised lazily, on the first frame, if the caller did
//!   not do it explicitly;
//! - frames must match the configured canvas size;
//! - `sleep` is only forwarded to a panel that was actually woken up.

use std::path::PathBuf;

use inkdash_core::{Frame, FrameError};
use thiserror::Error;
use tracing::{debug, info};

/// Full refresh (slow, flashes, clears ghosting) or partial (fast).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    Full,
    Partial,
}

/// Errors raised by the display driver and panel backends.
#[derive(Debug, Error)]
pub enum DisplayError {
    /// The frame does not have the canvas size the driver was built for.
    #[error("frame is {actual_width}x{actual_height}, display expects {expected_width}x{expected_height}")]
    SizeMismatch {
        expected_width: u32,
        expected_height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    /// Packing or encoding the frame failed.
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// Writing to the output file or device failed.
    #[error("I/O error writing display output to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A panel backend.
pub trait Panel: Send {
    /// Wakes the panel and prepares it for the given refresh mode.
    fn init(&mut self, mode: RefreshMode) -> Result<(), DisplayError>;

    /// Pushes a frame to the panel.
    fn display(&mut self, frame: &Frame, mode: RefreshMode) -> Result<(), DisplayError>;

    /// Blanks the panel to white.
    fn clear(&mut self) -> Result<(), DisplayError>;

    /// Puts the panel into its low-power state.
    fn sleep(&mut self) -> Result<(), DisplayError>;
}

/// Wraps a [`Panel`] with lazy initialisation and size checks.
pub struct DisplayDriver {
    panel: Box<dyn Panel>,
    width: u32,
    height: u32,
    initialized: bool,
}

impl DisplayDriver {
    pub fn new(panel: Box<dyn Panel>, width: u32, height: u32) -> Self {
        Self {
            panel,
            width,
            height,
            initialized: false,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Initialises the panel.
    ///
    /// # Errors
    ///
    /// Propagates the backend's error.
    pub fn init(&mut self, mode: RefreshMode) -> Result<(), DisplayError> {
        self.panel.init(mode)?;
        self.initialized = true;
        info!(width = self.width, height = self.height, ?mode, "display initialised");
        Ok(())
    }

    /// Pushes `frame` to the panel, initialising it first if needed.
    ///
    /// # Errors
    ///
    /// Returns [`DisplayError::SizeMismatch`] for a wrongly sized frame, or
    /// the backend's error.
    pub fn show(&mut self, frame: &Frame, mode: RefreshMode) -> Result<(), DisplayError> {
        if (frame.width(), frame.height()) != (self.width, self.height) {
            return Err(DisplayError::SizeMismatch {
                expected_width: self.width,
                expected_height: self.height,
                actual_width: frame.width(),
                actual_height: frame.height(),
            });
        }
        if !self.initialized {
            self.init(mode)?;
        }
        self.panel.display(frame, mode)?;
        debug!(?mode, "frame pushed to panel");
        Ok(())
    }

    /// Blanks the panel.
    ///
    /// # Errors
    ///
    /// Propagates the backend's error.
    pub fn clear(&mut self) -> Result<(), DisplayError> {
        if !self.initialized {
            self.init(RefreshMode::Full)?;
        }
        self.panel.clear()
    }

    /// Puts the panel to sleep if it was ever initialised.
    ///
    /// # Errors
    ///
    /// Propagates the backend's error.
    pub fn sleep(&mut self) -> Result<(), DisplayError> {
        if !self.initialized {
            return Ok(());
        }
        self.panel.sleep()?;
        self.initialized = false;
        info!("display asleep");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Init(RefreshMode),
        Display(RefreshMode),
        Clear,
        Sleep,
    }

    struct RecordingPanel {
        calls: Arc<Mutex<Vec<Call>>>,
    }

    impl Panel for RecordingPanel {
        fn init(&mut self, mode: RefreshMode) -> Result<(), DisplayError> {
            self.calls.lock().unwrap().push(Call::Init(mode));
            Ok(())
        }
        fn display(&mut self, _: &Frame, mode: RefreshMode) -> Result<(), DisplayError> {
            self.calls.lock().unwrap().push(Call::Display(mode));
            Ok(())
        }
        fn clear(&mut self) -> Result<(), DisplayError> {
            self.calls.lock().unwrap().push(Call::Clear);
            Ok(())
        }
        fn sleep(&mut self) -> Result<(), DisplayError> {
            self.calls.lock().unwrap().push(Call::Sleep);
            Ok(())
        }
    }

    fn make_driver() -> (DisplayDriver, Arc<Mutex<Vec<Call>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let panel = RecordingPanel {
            calls: Arc::clone(&calls),
        };
        (DisplayDriver::new(Box::new(panel), 250, 122), calls)
    }

    #[test]
    fn test_first_show_initialises_panel() {
        // Arrange
        let (mut driver, calls) = make_driver();

        // Act
        driver.show(&Frame::new(250, 122), RefreshMode::Full).unwrap();

        // Assert
        assert_eq!(
            *calls.lock().unwrap(),
            vec![Call::Init(RefreshMode::Full), Call::Display(RefreshMode::Full)]
        );
    }

    #[test]
    fn test_explicit_init_is_not_repeated() {
        let (mut driver, calls) = make_driver();
        driver.init(RefreshMode::Full).unwrap();
        driver.show(&Frame::new(250, 122), RefreshMode::Partial).unwrap();
        assert_eq!(calls.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_wrong_frame_size_is_rejected_before_touching_panel() {
        let (mut driver, calls) = make_driver();
        let err = driver.show(&Frame::new(122, 250), RefreshMode::Full).unwrap_err();
        assert!(matches!(err, DisplayError::SizeMismatch { actual_width: 122, .. }));
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_sleep_without_init_is_noop() {
        let (mut driver, calls) = make_driver();
        driver.sleep().unwrap();
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_sleep_after_show_reaches_panel() {
        let (mut driver, calls) = make_driver();
        driver.show(&Frame::new(250, 122), RefreshMode::Full).unwrap();
        driver.sleep().unwrap();
        assert_eq!(calls.lock().unwrap().last(), Some(&Call::Sleep));
        assert!(!driver.is_initialized());
    }
}
