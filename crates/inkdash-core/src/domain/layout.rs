//! Screen geometry.
//!
//! A screen stacks its widgets vertically in equal-height strips, with a
//! one-pixel separator line at the bottom of every strip except the last.
//! In multi-screen mode a row of small squares at the bottom shows which
//! screen is current.

use embedded_graphics::prelude::{Point, Size};
use embedded_graphics::primitives::Rectangle;

/// An axis-aligned rectangle in canvas pixels.
///
/// `x`/`y` are signed to match `embedded-graphics` coordinates; width and
/// height are never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Bounds {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The whole canvas.
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Right edge (exclusive).
    pub fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    /// Bottom edge (exclusive).
    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }

    /// Horizontal centre.
    pub fn center_x(&self) -> i32 {
        self.x + (self.width / 2) as i32
    }

    /// Left or right half, used by the side-by-side weather layout.
    pub fn left_half(&self) -> Self {
        Self::new(self.x, self.y, self.width / 2, self.height)
    }

    pub fn right_half(&self) -> Self {
        let half = self.width / 2;
        Self::new(self.x + half as i32, self.y, self.width - half, self.height)
    }

    pub fn to_rectangle(&self) -> Rectangle {
        Rectangle::new(Point::new(self.x, self.y), Size::new(self.width, self.height))
    }
}

/// Splits `area` into `count` equal horizontal strips, top to bottom.
///
/// Strip height is `area.height / count` (integer division); any remainder
/// stays blank at the bottom.  Returns an empty list when `count` is zero.
pub fn split_rows(area: Bounds, count: usize) -> Vec<Bounds> {
    if count == 0 {
        return Vec::new();
    }
    let strip = area.height / count as u32;
    (0..count)
        .map(|i| Bounds::new(area.x, area.y + (i as u32 * strip) as i32, area.width, strip))
        .collect()
}

/// Y coordinates of the separator lines between `count` strips of `area`.
///
/// The separator for strip `i` sits on its last pixel row, `(i + 1) * h - 1`.
pub fn separator_rows(area: Bounds, count: usize) -> Vec<i32> {
    if count < 2 {
        return Vec::new();
    }
    let strip = (area.height / count as u32) as i32;
    (0..count - 1).map(|i| area.y + (i as i32 + 1) * strip - 1).collect()
}

/// Side length of one screen indicator square.
pub const INDICATOR_DOT_SIZE: u32 = 3;
/// Distance between the left edges of neighbouring squares.
pub const INDICATOR_DOT_SPACING: u32 = 8;

/// One screen indicator square.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorDot {
    pub bounds: Bounds,
    /// `true` for the current screen (filled), `false` for others (outlined).
    pub filled: bool,
}

/// Lays out the indicator row for `count` screens, centred near the bottom
/// edge of a `width`×`height` canvas.
///
/// Nothing is drawn for a single screen.
pub fn screen_indicator_dots(width: u32, height: u32, count: usize, current: usize) -> Vec<IndicatorDot> {
    if count < 2 {
        return Vec::new();
    }
    let n = count as i32;
    let dot = INDICATOR_DOT_SIZE as i32;
    let spacing = INDICATOR_DOT_SPACING as i32;
    let total_width = n * dot + (n - 1) * (spacing - dot);
    let start_x = (width as i32 - total_width).div_euclid(2);
    let y = height as i32 - 6;

    (0..count)
        .map(|i| IndicatorDot {
            bounds: Bounds::new(
                start_x + i as i32 * spacing,
                y,
                INDICATOR_DOT_SIZE,
                INDICATOR_DOT_SIZE,
            ),
            filled: i == current,
        })
        .collect()
}
