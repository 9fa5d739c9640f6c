//! Time and date.

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use inkdash_core::{Bounds, ClockFormat};

use crate::application::canvas::{Anchor, Canvas, FontSize};
use crate::application::widget::{Widget, WidgetError};

pub struct ClockWidget {
    format: ClockFormat,
    now: NaiveDateTime,
}

impl ClockWidget {
    pub fn new(format: ClockFormat) -> Self {
        Self::at(format, Local::now().naive_local())
    }

    /// A clock frozen at `now` until the next [`Widget::update`].
    pub fn at(format: ClockFormat, now: NaiveDateTime) -> Self {
        Self { format, now }
    }

    /// `3:07 PM` or `15:07`.
    pub fn time_text(&self) -> String {
        match self.format {
            ClockFormat::TwelveHour => {
                let text = self.now.format("%I:%M %p").to_string();
                text.strip_prefix('0').map(str::to_string).unwrap_or(text)
            }
            ClockFormat::TwentyFourHour => self.now.format("%H:%M").to_string(),
        }
    }

    /// `Monday, January 05`.
    pub fn date_text(&self) -> String {
        self.now.format("%A, %B %d").to_string()
    }
}

#[async_trait]
impl Widget for ClockWidget {
    fn name(&self) -> &'static str {
        "clock"
    }

    async fn update(&mut self) -> Result<bool, WidgetError> {
        self.now = Local::now().naive_local();
        Ok(true)
    }

    fn render(&self, canvas: &mut Canvas<'_>, bounds: Bounds) {
        // Half-height strips get smaller fonts so the two lines don't touch.
        let (time_size, date_size) = if bounds.height < 80 {
            (FontSize::Large, FontSize::Small)
        } else {
            (FontSize::Huge, FontSize::Medium)
        };
        let h = bounds.height as i32;
        canvas.draw_text(&self.time_text(), bounds.center_x(), bounds.y + h / 3, time_size, true, Anchor::Center);
        canvas.draw_text(
            &self.date_text(),
            bounds.center_x(),
            bounds.y + 2 * h / 3,
            date_size,
            false,
            Anchor::Center,
        );
    }

    fn shows_time(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use inkdash_core::Frame;

    fn afternoon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 5)
            .unwrap()
            .and_hms_opt(15, 7, 0)
            .unwrap()
    }

    #[test]
    fn test_twelve_hour_drops_leading_zero() {
        let clock = ClockWidget::at(ClockFormat::TwelveHour, afternoon());
        assert_eq!(clock.time_text(), "3:07 PM");
    }

    #[test]
    fn test_twenty_four_hour_keeps_minutes() {
        let clock = ClockWidget::at(ClockFormat::TwentyFourHour, afternoon());
        assert_eq!(clock.time_text(), "15:07");
    }

    #[test]
    fn test_date_text_is_long_form() {
        let clock = ClockWidget::at(ClockFormat::TwelveHour, afternoon());
        assert_eq!(clock.date_text(), "Monday, January 05");
    }

    #[test]
    fn test_render_stays_inside_strip() {
        // Arrange: clock in the bottom half of the canvas
        let mut frame = Frame::new(250, 122);
        let strip = Bounds::new(0, 61, 250, 61);
        let clock = ClockWidget::at(ClockFormat::TwelveHour, afternoon());

        // Act
        clock.render(&mut Canvas::new(&mut frame), strip);

        // Assert
        assert!(frame.count_black_in(strip) > 0);
        assert_eq!(frame.count_black_in(Bounds::new(0, 0, 250, 61)), 0);
    }

    #[tokio::test]
    async fn test_update_always_succeeds() {
        let mut clock = ClockWidget::at(ClockFormat::TwelveHour, afternoon());
        assert!(clock.update().await.unwrap());
        assert!(clock.shows_time());
    }
}
