//! The 1-bit frame buffer.
//!
//! A [`Frame`] is what every widget draws into and what the display driver
//! hands to the panel.  Pixels are either ink (black) or paper (white); there
//! is no grey on an e-paper panel.
//!
//! # Memory layout
//!
//! Rows are stored top to bottom, each row packed eight pixels per byte with
//! the left-most pixel in the most significant bit and the row padded to a
//! whole byte.  A set bit is black.  This happens to be exactly the raster
//! layout of a binary PBM (`P4`) file, so [`Frame::to_pbm`] only has to
//! prepend a header.
//!
//! # Drawing
//!
//! `Frame` implements `embedded_graphics::draw_target::DrawTarget` with
//! `BinaryColor`, so text, lines, and shapes from `embedded-graphics` can be
//! drawn straight into it.  `BinaryColor::On` is black ink.

use std::convert::Infallible;

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::{DrawTarget, OriginDimensions, Pixel, Size};
use thiserror::Error;

use super::layout::Bounds;

/// Errors raised when converting a frame to or from another representation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// The frame matches the panel in neither orientation.
    #[error("frame is {frame_width}x{frame_height} but the panel is {panel_width}x{panel_height}")]
    SizeMismatch {
        frame_width: u32,
        frame_height: u32,
        panel_width: u32,
        panel_height: u32,
    },

    /// Input is not a well-formed binary PBM image.
    #[error("invalid PBM image: {0}")]
    InvalidPbm(String),
}

/// A monochrome bitmap.  New frames are all white.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    stride: usize,
    bits: Vec<u8>,
}

impl Frame {
    /// Creates a white frame of `width`×`height` pixels.
    pub fn new(width: u32, height: u32) -> Self {
        let stride = (width as usize).div_ceil(8);
        Self {
            width,
            height,
            stride,
            bits: vec![0; stride * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Resets every pixel to white.
    pub fn clear(&mut self) {
        self.bits.fill(0);
    }

    /// Sets one pixel.  Coordinates outside the frame are ignored.
    pub fn set_pixel(&mut self, x: u32, y: u32, black: bool) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = y as usize * self.stride + x as usize / 8;
        let mask = 0x80u8 >> (x % 8);
        if black {
            self.bits[idx] |= mask;
        } else {
            self.bits[idx] &= !mask;
        }
    }

    /// Returns `true` if the pixel is black.  Outside the frame reads as white.
    pub fn pixel(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let idx = y as usize * self.stride + x as usize / 8;
        self.bits[idx] & (0x80u8 >> (x % 8)) != 0
    }

    /// Paints every pixel of `area` that lies inside the frame.
    pub fn fill_region(&mut self, area: Bounds, black: bool) {
        let x0 = area.x.max(0) as u32;
        let y0 = area.y.max(0) as u32;
        let x1 = area.right().clamp(0, self.width as i32) as u32;
        let y1 = area.bottom().clamp(0, self.height as i32) as u32;
        for y in y0..y1 {
            for x in x0..x1 {
                self.set_pixel(x, y, black);
            }
        }
    }

    /// Number of black pixels in `area`.
    pub fn count_black_in(&self, area: Bounds) -> usize {
        let x0 = area.x.max(0) as u32;
        let y0 = area.y.max(0) as u32;
        let x1 = area.right().clamp(0, self.width as i32) as u32;
        let y1 = area.bottom().clamp(0, self.height as i32) as u32;
        (y0..y1)
            .flat_map(|y| (x0..x1).map(move |x| (x, y)))
            .filter(|&(x, y)| self.pixel(x, y))
            .count()
    }

    /// Number of black pixels in the whole frame.
    pub fn count_black(&self) -> usize {
        self.count_black_in(Bounds::full(self.width, self.height))
    }

    // ── Encodings ─────────────────────────────────────────────────────────────

    /// Encodes the frame as a binary PBM (`P4`) image.
    pub fn to_pbm(&self) -> Vec<u8> {
        let mut out = format!("P4\n{} {}\n", self.width, self.height).into_bytes();
        out.extend_from_slice(&self.bits);
        out
    }

    /// Decodes a binary PBM (`P4`) image.
    ///
    /// Only the simple header produced by [`Frame::to_pbm`] and common tools
    /// is accepted: magic, width, and height separated by single whitespace
    /// characters, with no comments.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::InvalidPbm`] for a bad header or short raster.
    pub fn from_pbm(data: &[u8]) -> Result<Self, FrameError> {
        let mut fields = Vec::with_capacity(3);
        let mut pos = 0;
        while fields.len() < 3 {
            while pos < data.len() && data[pos].is_ascii_whitespace() {
                pos += 1;
            }
            let start = pos;
            while pos < data.len() && !data[pos].is_ascii_whitespace() {
                pos += 1;
            }
            if start == pos {
                return Err(FrameError::InvalidPbm("truncated header".to_string()));
            }
            fields.push(String::from_utf8_lossy(&data[start..pos]).into_owned());
        }
        // Exactly one whitespace byte separates the header from the raster.
        pos += 1;

        if fields[0] != "P4" {
            return Err(FrameError::InvalidPbm(format!("unsupported magic {:?}", fields[0])));
        }
        let width: u32 = fields[1]
            .parse()
            .map_err(|_| FrameError::InvalidPbm(format!("bad width {:?}", fields[1])))?;
        let height: u32 = fields[2]
            .parse()
            .map_err(|_| FrameError::InvalidPbm(format!("bad height {:?}", fields[2])))?;

        let mut frame = Frame::new(width, height);
        let raster = data.get(pos..pos + frame.bits.len()).ok_or_else(|| {
            FrameError::InvalidPbm(format!(
                "expected {} raster bytes, found {}",
                frame.bits.len(),
                data.len().saturating_sub(pos)
            ))
        })?;
        frame.bits.copy_from_slice(raster);
        Ok(frame)
    }

    /// Packs the frame into the byte layout the e-paper controller expects.
    ///
    /// The controller addresses its RAM in the panel's native (portrait)
    /// orientation, one bit per pixel, MSB first, rows padded to whole bytes,
    /// and, unlike [`Frame`], a *set* bit is white.
    ///
    /// A frame that is already `panel_width`×`panel_height` is packed as-is.
    /// A landscape frame of `panel_height`×`panel_width` is rotated so that
    /// frame pixel `(x, y)` lands on panel pixel `(y, panel_height - 1 - x)`.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::SizeMismatch`] if neither orientation fits.
    pub fn to_panel_buffer(&self, panel_width: u32, panel_height: u32) -> Result<Vec<u8>, FrameError> {
        let line = (panel_width as usize).div_ceil(8);
        let mut buf = vec![0xFFu8; line * panel_height as usize];

        let mut clear = |px: u32, py: u32| {
            buf[px as usize / 8 + py as usize * line] &= !(0x80u8 >> (px % 8));
        };

        if self.width == panel_width && self.height == panel_height {
            for y in 0..self.height {
                for x in 0..self.width {
                    if self.pixel(x, y) {
                        clear(x, y);
                    }
                }
            }
        } else if self.width == panel_height && self.height == panel_width {
            for y in 0..self.height {
                for x in 0..self.width {
                    if self.pixel(x, y) {
                        clear(y, panel_height - x - 1);
                    }
                }
            }
        } else {
            return Err(FrameError::SizeMismatch {
                frame_width: self.width,
                frame_height: self.height,
                panel_width,
                panel_height,
            });
        }
        Ok(buf)
    }
}

// ── embedded-graphics integration ─────────────────────────────────────────────

impl OriginDimensions for Frame {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for Frame {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x >= 0 && point.y >= 0 {
                self.set_pixel(point.x as u32, point.y as u32, color.is_on());
            }
        }
        Ok(())
    }
}
