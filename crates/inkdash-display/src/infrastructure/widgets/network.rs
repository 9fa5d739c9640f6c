//! Interface throughput, byte totals and the open-socket count.
//!
//! Speeds are the counter deltas between two updates divided by the time
//! between them, so the first update after start-up shows zero.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use inkdash_core::domain::config::NetworkConfig;
use inkdash_core::domain::format::{format_bytes, format_speed};
use inkdash_core::Bounds;
use tracing::{debug, warn};

use super::source_failed;
use crate::application::canvas::{Anchor, Canvas, FontSize};
use crate::application::widget::{Widget, WidgetError};
use crate::infrastructure::sources::{CounterSource, InterfaceCounters};

const NAME: &str = "network";

/// Interfaces never chosen by auto-detection.
const LOOPBACK: [&str; 2] = ["lo", "lo0"];

/// Name used when counters are summed over every interface.
const TOTAL: &str = "total";

fn sum_all(ifaces: &[InterfaceCounters]) -> InterfaceCounters {
    ifaces.iter().fold(
        InterfaceCounters {
            name: TOTAL.to_string(),
            rx_bytes: 0,
            tx_bytes: 0,
        },
        |mut acc, i| {
            acc.rx_bytes = acc.rx_bytes.saturating_add(i.rx_bytes);
            acc.tx_bytes = acc.tx_bytes.saturating_add(i.tx_bytes);
            acc
        },
    )
}

/// Picks the counters to show.
///
/// A configured interface is used when present, otherwise the sum of all
/// interfaces.  Without configuration the busiest non-loopback interface is
/// chosen.
pub fn select_interface(configured: Option<&str>, ifaces: &[InterfaceCounters]) -> InterfaceCounters {
    match configured {
        Some(name) => ifaces.iter().find(|i| i.name == name).cloned().unwrap_or_else(|| {
            warn!("interface {name} not found, using total");
            sum_all(ifaces)
        }),
        None => ifaces
            .iter()
            .filter(|i| !LOOPBACK.contains(&i.name.as_str()) && i.total() > 0)
            .max_by_key(|i| i.total())
            .cloned()
            .unwrap_or_else(|| sum_all(ifaces)),
    }
}

pub struct NetworkWidget {
    config: NetworkConfig,
    source: Arc<dyn CounterSource>,
    interface: String,
    sent: u64,
    received: u64,
    /// KB/s.
    speed_up: f64,
    speed_down: f64,
    connections: usize,
    last_sample: Option<(Instant, InterfaceCounters)>,
}

impl NetworkWidget {
    pub fn new(config: &NetworkConfig, source: Arc<dyn CounterSource>) -> Self {
        Self {
            config: config.clone(),
            source,
            interface: config.interface.clone().unwrap_or_else(|| TOTAL.to_string()),
            sent: 0,
            received: 0,
            speed_up: 0.0,
            speed_down: 0.0,
            connections: 0,
            last_sample: None,
        }
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Upload and download speed in KB/s.
    pub fn speeds(&self) -> (f64, f64) {
        (self.speed_up, self.speed_down)
    }

    pub fn totals(&self) -> (u64, u64) {
        (self.sent, self.received)
    }

    /// Folds in a counter sample taken at `at`.
    ///
    /// Speed is only computed against a previous sample of the same
    /// interface; counters that went backwards (interface reset) count as
    /// zero traffic.
    fn apply_sample(&mut self, sample: InterfaceCounters, at: Instant) {
        if let Some((prev_at, prev)) = &self.last_sample {
            let secs = at.saturating_duration_since(*prev_at).as_secs_f64();
            if secs > 0.0 && prev.name == sample.name {
                self.speed_up = sample.tx_bytes.saturating_sub(prev.tx_bytes) as f64 / secs / 1024.0;
                self.speed_down = sample.rx_bytes.saturating_sub(prev.rx_bytes) as f64 / secs / 1024.0;
            }
        }
        self.interface = sample.name.clone();
        self.sent = sample.tx_bytes;
        self.received = sample.rx_bytes;
        self.last_sample = Some((at, sample));
    }

    fn render_vertical(&self, canvas: &mut Canvas<'_>, b: Bounds) {
        let start_y = b.y + 20;
        let right = b.right() - 5;
        let left = b.x + 5;
        if self.config.show_bandwidth {
            let rows = [
                ("Upload:", format_speed(self.speed_up), 0, FontSize::Small, true),
                ("Download:", format_speed(self.speed_down), 15, FontSize::Small, true),
                ("Sent:", format_bytes(self.sent), 32, FontSize::Tiny, false),
                ("Received:", format_bytes(self.received), 44, FontSize::Tiny, false),
            ];
            for (label, value, dy, size, bold) in rows {
                canvas.draw_text(label, left, start_y + dy, size, bold, Anchor::TopLeft);
                canvas.draw_text(&value, right, start_y + dy, size, false, Anchor::TopRight);
            }
        }
        if self.config.show_devices {
            let text = format!("Connections: {}", self.connections);
            canvas.draw_text(&text, left, start_y + 58, FontSize::Tiny, false, Anchor::TopLeft);
        }
    }

    fn render_compact(&self, canvas: &mut Canvas<'_>, b: Bounds) {
        let start_y = b.y + 18;
        if self.config.show_bandwidth {
            let mid_x = b.center_x() + 10;
            canvas.draw_triangle_up(b.x + 5, start_y + 1, 7);
            canvas.draw_text(&format_speed(self.speed_up), b.x + 16, start_y, FontSize::Small, false, Anchor::TopLeft);
            canvas.draw_triangle_down(mid_x, start_y + 1, 7);
            canvas.draw_text(&format_speed(self.speed_down), mid_x + 11, start_y, FontSize::Small, false, Anchor::TopLeft);

            let sent = format!("Sent: {}", format_bytes(self.sent));
            let recv = format!("Recv: {}", format_bytes(self.received));
            canvas.draw_text(&sent, b.x + 5, start_y + 15, FontSize::Tiny, false, Anchor::TopLeft);
            canvas.draw_text(&recv, b.right() - 5, start_y + 15, FontSize::Tiny, false, Anchor::TopRight);
        }
        if self.config.show_devices {
            let text = format!("Conn: {}", self.connections);
            canvas.draw_text(&text, b.x + 5, start_y + 27, FontSize::Tiny, false, Anchor::TopLeft);
        }
    }
}

#[async_trait]
impl Widget for NetworkWidget {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn update(&mut self) -> Result<bool, WidgetError> {
        let ifaces = self.source.interfaces().map_err(source_failed(NAME))?;
        let sample = select_interface(self.config.interface.as_deref(), &ifaces);
        if self.config.show_devices {
            match self.source.connection_count() {
                Ok(n) => self.connections = n,
                Err(e) => warn!("could not count connections: {e}"),
            }
        }
        self.apply_sample(sample, Instant::now());
        debug!(
            interface = %self.interface,
            "network updated: up {} down {}",
            format_speed(self.speed_up),
            format_speed(self.speed_down)
        );
        Ok(true)
    }

    fn render(&self, canvas: &mut Canvas<'_>, bounds: Bounds) {
        let title = format!("Network ({})", self.interface);
        canvas.draw_text(&title, bounds.x + 5, bounds.y + 3, FontSize::Small, true, Anchor::TopLeft);
        if bounds.height >= 80 {
            self.render_vertical(canvas, bounds);
        } else {
            self.render_compact(canvas, bounds);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::sources::mock::MockCounterSource;
    use inkdash_core::Frame;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    fn counters(name: &str, rx: u64, tx: u64) -> InterfaceCounters {
        InterfaceCounters {
            name: name.to_string(),
            rx_bytes: rx,
            tx_bytes: tx,
        }
    }

    fn make_widget(config: NetworkConfig) -> (NetworkWidget, Arc<MockCounterSource>) {
        let source = Arc::new(MockCounterSource::new());
        (NetworkWidget::new(&config, source.clone()), source)
    }

    #[test]
    fn test_auto_selection_picks_busiest_non_loopback() {
        let ifaces = [counters("lo", 9_000, 9_000), counters("eth0", 100, 50), counters("wlan0", 5_000, 10)];
        assert_eq!(select_interface(None, &ifaces).name, "wlan0");
    }

    #[test]
    fn test_missing_configured_interface_falls_back_to_total() {
        // Arrange
        let ifaces = [counters("eth0", 100, 50), counters("wlan0", 10, 5)];

        // Act
        let chosen = select_interface(Some("usb0"), &ifaces);

        // Assert
        assert_eq!(chosen, counters("total", 110, 55));
    }

    #[test]
    fn test_speed_is_delta_over_elapsed_time() {
        // Arrange
        let (mut widget, _) = make_widget(NetworkConfig::default());
        let t0 = Instant::now();

        // Act: 20 KiB sent and 40 KiB received over two seconds
        widget.apply_sample(counters("eth0", 0, 0), t0);
        widget.apply_sample(counters("eth0", 40 * 1024, 20 * 1024), t0 + Duration::from_secs(2));

        // Assert
        assert_eq!(widget.speeds(), (10.0, 20.0));
        assert_eq!(widget.totals(), (20 * 1024, 40 * 1024));
    }

    #[test]
    fn test_counter_reset_reads_as_zero_speed() {
        let (mut widget, _) = make_widget(NetworkConfig::default());
        let t0 = Instant::now();
        widget.apply_sample(counters("eth0", 5000, 5000), t0);
        widget.apply_sample(counters("eth0", 10, 10), t0 + Duration::from_secs(1));
        assert_eq!(widget.speeds(), (0.0, 0.0));
    }

    #[tokio::test]
    async fn test_update_reads_connections_only_when_enabled() {
        // Arrange
        let config = NetworkConfig {
            show_devices: true,
            ..NetworkConfig::default()
        };
        let (mut widget, source) = make_widget(config);
        source.set_counters("eth0", 1, 1);
        source.connections.store(7, Ordering::Relaxed);

        // Act
        widget.update().await.unwrap();

        // Assert
        assert_eq!(widget.connections, 7);
        assert_eq!(widget.interface(), "eth0");
    }

    #[tokio::test]
    async fn test_source_failure_is_reported() {
        let (mut widget, source) = make_widget(NetworkConfig::default());
        source.should_fail.store(true, Ordering::Relaxed);
        assert!(matches!(widget.update().await, Err(WidgetError::Source { widget: "network", .. })));
    }

    #[test]
    fn test_both_layouts_render() {
        let (widget, _) = make_widget(NetworkConfig::default());

        let mut tall = Frame::new(250, 122);
        widget.render(&mut Canvas::new(&mut tall), Bounds::full(250, 122));
        let mut short = Frame::new(250, 61);
        widget.render(&mut Canvas::new(&mut short), Bounds::full(250, 61));

        assert!(tall.count_black_in(Bounds::new(0, 20, 250, 60)) > 0);
        assert!(short.count_black_in(Bounds::new(0, 18, 250, 30)) > 0);
    }
}
