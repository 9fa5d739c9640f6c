//! Drawing helpers on top of a [`Frame`].
//!
//! Widgets never talk to `embedded-graphics` directly; they call the small
//! vocabulary below (text with an anchor, lines, rectangles, arrows).  All
//! text uses the ISO 8859-1 mono fonts so `°` renders correctly.

use std::convert::Infallible;

use embedded_graphics::mono_font::iso_8859_1::{
    FONT_10X20, FONT_5X8, FONT_6X10, FONT_6X13_BOLD, FONT_7X13, FONT_7X13_BOLD, FONT_9X15,
    FONT_9X15_BOLD,
};
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::{Drawable, Point, Primitive};
use embedded_graphics::primitives::{Line, PrimitiveStyle, Triangle};
use embedded_graphics::text::{Baseline, Text};
use inkdash_core::{Bounds, Frame};

/// Text sizes, roughly 8 to 20 pixels tall.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontSize {
    Tiny,
    Small,
    Medium,
    Large,
    Huge,
}

/// Which point of the text box `(x, y)` refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    TopLeft,
    TopCenter,
    TopRight,
    /// Centred both horizontally and vertically.
    Center,
}

/// How [`Canvas::draw_rect`] paints a rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RectStyle {
    Outline,
    Filled,
    /// Sparse dither that reads as light grey on e-paper.
    Shaded,
}

fn font(size: FontSize, bold: bool) -> &'static MonoFont<'static> {
    match (size, bold) {
        (FontSize::Tiny, _) => &FONT_5X8,
        (FontSize::Small, false) => &FONT_6X10,
        (FontSize::Small, true) => &FONT_6X13_BOLD,
        (FontSize::Medium, false) => &FONT_7X13,
        (FontSize::Medium, true) => &FONT_7X13_BOLD,
        (FontSize::Large, false) => &FONT_9X15,
        (FontSize::Large, true) => &FONT_9X15_BOLD,
        (FontSize::Huge, _) => &FONT_10X20,
    }
}

/// A mutable drawing surface borrowed from a frame.
pub struct Canvas<'a> {
    frame: &'a mut Frame,
}

impl<'a> Canvas<'a> {
    pub fn new(frame: &'a mut Frame) -> Self {
        Self { frame }
    }

    pub fn width(&self) -> u32 {
        self.frame.width()
    }

    pub fn height(&self) -> u32 {
        self.frame.height()
    }

    pub fn frame(&self) -> &Frame {
        self.frame
    }

    /// Resets the whole surface to white.
    pub fn clear(&mut self) {
        self.frame.clear();
    }

    /// Pixel width of `text` in the given font.
    pub fn text_width(text: &str, size: FontSize, bold: bool) -> u32 {
        let f = font(size, bold);
        let n = text.chars().count() as u32;
        if n == 0 {
            return 0;
        }
        n * (f.character_size.width + f.character_spacing) - f.character_spacing
    }

    /// Pixel height of one line of text in the given font.
    pub fn line_height(size: FontSize, bold: bool) -> u32 {
        font(size, bold).character_size.height
    }

    /// Draws `text` anchored at `(x, y)` and returns its pixel width.
    pub fn draw_text(
        &mut self,
        text: &str,
        x: i32,
        y: i32,
        size: FontSize,
        bold: bool,
        anchor: Anchor,
    ) -> u32 {
        let width = Self::text_width(text, size, bold);
        let height = Self::line_height(size, bold);
        let (left, top) = match anchor {
            Anchor::TopLeft => (x, y),
            Anchor::TopCenter => (x - (width / 2) as i32, y),
            Anchor::TopRight => (x - width as i32, y),
            Anchor::Center => (x - (width / 2) as i32, y - (height / 2) as i32),
        };
        let style = MonoTextStyle::new(font(size, bold), BinaryColor::On);
        self.paint(&Text::with_baseline(text, Point::new(left, top), style, Baseline::Top));
        width
    }

    /// Draws `text` centred horizontally in `bounds`, top edge at `y`.
    pub fn draw_centered_text(&mut self, text: &str, bounds: Bounds, y: i32, size: FontSize, bold: bool) -> u32 {
        self.draw_text(text, bounds.center_x(), y, size, bold, Anchor::TopCenter)
    }

    /// One-pixel line between two points.
    pub fn draw_line(&mut self, from: (i32, i32), to: (i32, i32)) {
        let line = Line::new(Point::new(from.0, from.1), Point::new(to.0, to.1))
            .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1));
        self.paint(&line);
    }

    /// Horizontal line across `[x0, x1]` at row `y`.
    pub fn hline(&mut self, y: i32, x0: i32, x1: i32) {
        self.draw_line((x0, y), (x1, y));
    }

    /// Vertical line across `[y0, y1]` at column `x`.
    pub fn vline(&mut self, x: i32, y0: i32, y1: i32) {
        self.draw_line((x, y0), (x, y1));
    }

    pub fn draw_rect(&mut self, area: Bounds, style: RectStyle) {
        match style {
            RectStyle::Outline => {
                let shape = area
                    .to_rectangle()
                    .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1));
                self.paint(&shape);
            }
            RectStyle::Filled => self.frame.fill_region(area, true),
            RectStyle::Shaded => {
                for y in area.y.max(0)..area.bottom() {
                    for x in area.x.max(0)..area.right() {
                        if x % 2 == 0 && y % 2 == 0 && (x + y) % 4 == 0 {
                            self.frame.set_pixel(x as u32, y as u32, true);
                        }
                    }
                }
            }
        }
    }

    /// Filled upward arrow head, `size` pixels wide, apex at `(x + size/2, y)`.
    pub fn draw_triangle_up(&mut self, x: i32, y: i32, size: u32) {
        let s = size as i32;
        self.fill_triangle((x + s / 2, y), (x, y + s - 1), (x + s - 1, y + s - 1));
    }

    /// Filled downward arrow head, `size` pixels wide, apex at the bottom.
    pub fn draw_triangle_down(&mut self, x: i32, y: i32, size: u32) {
        let s = size as i32;
        self.fill_triangle((x, y), (x + s - 1, y), (x + s / 2, y + s - 1));
    }

    fn fill_triangle(&mut self, a: (i32, i32), b: (i32, i32), c: (i32, i32)) {
        let shape = Triangle::new(Point::new(a.0, a.1), Point::new(b.0, b.1), Point::new(c.0, c.1))
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::On));
        self.paint(&shape);
    }

    fn paint<D>(&mut self, drawable: &D)
    where
        D: Drawable<Color = BinaryColor>,
    {
        if let Err(never) = drawable.draw(self.frame) {
            let never: Infallible = never;
            match never {}
        }
    }
}
