//! Writes packed panel buffers to a device node or file.
//!
//! The buffer is the panel's native layout: `panel_width` pixels per row,
//! rows padded to whole bytes, most significant bit first, `1` = white.  A
//! landscape frame is rotated into the portrait panel orientation on the way
//! out (see [`Frame::to_panel_buffer`]).  Anything that accepts such a buffer
//! (a kernel framebuffer shim, a userspace SPI bridge reading a FIFO) can sit
//! behind `device_path`.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use inkdash_core::Frame;
use tracing::{debug, info};

use crate::application::display::{DisplayError, Panel, RefreshMode};

pub struct RawPanel {
    device_path: PathBuf,
    panel_width: u32,
    panel_height: u32,
}

impl RawPanel {
    pub fn new(device_path: impl AsRef<Path>, panel_width: u32, panel_height: u32) -> Self {
        Self {
            device_path: device_path.as_ref().to_path_buf(),
            panel_width,
            panel_height,
        }
    }

    /// Size in bytes of one full buffer.
    pub fn buffer_len(&self) -> usize {
        (self.panel_width as usize).div_ceil(8) * self.panel_height as usize
    }

    fn write(&self, bytes: &[u8]) -> Result<(), DisplayError> {
        let io_err = |source| DisplayError::Io {
            path: self.device_path.clone(),
            source,
        };
        // No truncation so device nodes are written in place.
        let mut out = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.device_path)
            .map_err(io_err)?;
        out.write_all(bytes).map_err(io_err)?;
        out.flush().map_err(io_err)
    }
}

impl Panel for RawPanel {
    fn init(&mut self, mode: RefreshMode) -> Result<(), DisplayError> {
        info!(
            device = %self.device_path.display(),
            width = self.panel_width,
            height = self.panel_height,
            ?mode,
            "raw panel ready"
        );
        Ok(())
    }

    fn display(&mut self, frame: &Frame, mode: RefreshMode) -> Result<(), DisplayError> {
        let buffer = frame.to_panel_buffer(self.panel_width, self.panel_height)?;
        self.write(&buffer)?;
        debug!(bytes = buffer.len(), ?mode, "buffer written to panel");
        Ok(())
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        self.write(&vec![0xFF; self.buffer_len()])
    }

    fn sleep(&mut self) -> Result<(), DisplayError> {
        debug!("raw panel asleep");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_device() -> PathBuf {
        std::env::temp_dir().join(format!("inkdash-raw-{}.bin", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_landscape_frame_is_written_rotated() {
        // Arrange: 250x122 frame for a 122x250 panel
        let path = temp_device();
        let mut panel = RawPanel::new(&path, 122, 250);
        let mut frame = Frame::new(250, 122);
        frame.set_pixel(0, 0, true);

        // Act
        panel.display(&frame, RefreshMode::Full).unwrap();

        // Assert: (0,0) lands at panel (0, 249), the first bit of the last row
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), panel.buffer_len());
        assert_eq!(bytes.len(), 16 * 250);
        assert_eq!(bytes[16 * 249], 0x7F);
        assert_eq!(bytes.iter().filter(|&&b| b != 0xFF).count(), 1);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_clear_writes_all_white() {
        let path = temp_device();
        let mut panel = RawPanel::new(&path, 122, 250);
        panel.clear().unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.iter().all(|&b| b == 0xFF));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_mismatched_frame_is_rejected() {
        let mut panel = RawPanel::new(temp_device(), 122, 250);
        let err = panel.display(&Frame::new(100, 100), RefreshMode::Full).unwrap_err();
        assert!(matches!(err, DisplayError::Frame(_)));
    }
}
