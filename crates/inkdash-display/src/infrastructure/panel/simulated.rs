//! File-writing panel for machines without e-paper hardware.

use std::path::{Path, PathBuf};

use inkdash_core::Frame;
use tracing::{debug, info};

use crate::application::display::{DisplayError, Panel, RefreshMode};

/// Writes every frame as a binary PBM image.
pub struct SimulatedPanel {
    output_path: PathBuf,
    frames_written: u64,
}

impl SimulatedPanel {
    pub fn new(output_path: impl AsRef<Path>) -> Self {
        Self {
            output_path: output_path.as_ref().to_path_buf(),
            frames_written: 0,
        }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    fn write(&self, bytes: &[u8]) -> Result<(), DisplayError> {
        let io_err = |source| DisplayError::Io {
            path: self.output_path.clone(),
            source,
        };
        if let Some(dir) = self.output_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(io_err)?;
        }
        std::fs::write(&self.output_path, bytes).map_err(io_err)
    }
}

impl Panel for SimulatedPanel {
    fn init(&mut self, mode: RefreshMode) -> Result<(), DisplayError> {
        info!(path = %self.output_path.display(), ?mode, "simulated display ready");
        Ok(())
    }

    fn display(&mut self, frame: &Frame, mode: RefreshMode) -> Result<(), DisplayError> {
        self.write(&frame.to_pbm())?;
        self.frames_written += 1;
        debug!(path = %self.output_path.display(), ?mode, frame = self.frames_written, "frame written");
        Ok(())
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        // Keep the last image size if one was written; otherwise nothing to blank.
        match std::fs::read(&self.output_path) {
            Ok(bytes) => {
                let frame = Frame::from_pbm(&bytes)?;
                self.write(&Frame::new(frame.width(), frame.height()).to_pbm())
            }
            Err(_) => Ok(()),
        }
    }

    fn sleep(&mut self) -> Result<(), DisplayError> {
        debug!("simulated display asleep");
        Ok(())
    }
}
