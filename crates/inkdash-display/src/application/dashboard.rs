//! The dashboard use case: one refresh cycle, clock ticks, and the polling
//! loop that drives them.
//!
//! # Refresh cycle (for beginners)
//!
//! Every `refresh.interval_minutes` the dashboard:
//!
//! 1. re-reads the YAML file (that is how edits made in the web panel reach
//!    the screen).  Only widgets whose own section changed are rebuilt; the
//!    rest are carried over with their last good data;
//! 2. optionally advances to the next screen (`display.rotate_screens`);
//! 3. asks every widget on the current screen to refresh its data;
//! 4. renders the screen into the frame buffer and pushes it to the panel.
//!    The very first push is a full refresh; later ones are partial.
//!
//! Between cycles, a screen that shows a clock is partially redrawn every
//! `refresh.clock_update_seconds` so the time stays current.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use inkdash_core::domain::config::DisplayConfig;
use inkdash_core::storage::config_store::read_config;
use inkdash_core::{DashboardConfig, Frame};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::canvas::Canvas;
use super::display::{DisplayDriver, DisplayError, RefreshMode};
use super::screens::{Screen, ScreenManager};
use super::widget::Widget;

/// Longest single sleep in the polling loop, so shutdown is noticed quickly.
const MAX_SLEEP: Duration = Duration::from_secs(1);

/// Builds widgets by configuration name.
pub trait WidgetFactory: Send + Sync {
    /// Returns `None` for an unknown widget name.
    fn build(&self, name: &str, config: &DashboardConfig) -> Option<Box<dyn Widget>>;

    /// Whether a widget configured as `name` must be rebuilt when the
    /// document changes from `old` to `new`.
    ///
    /// Each built-in widget reads one section; a widget whose section is
    /// unchanged keeps its instance, and with it the data it last loaded.
    fn needs_rebuild(&self, name: &str, old: &DashboardConfig, new: &DashboardConfig) -> bool {
        match name {
            "clock" | "clock_compact" => old.clock != new.clock,
            "weather" | "weather_compact" => old.weather != new.weather,
            "portfolio" | "portfolio_summary" => old.portfolio != new.portfolio,
            "network" => old.network != new.network,
            _ => true,
        }
    }
}

/// Widgets from the previous build that may be reused by the next one.
struct Carryover<'a> {
    previous: &'a DashboardConfig,
    widgets: Vec<Box<dyn Widget>>,
}

impl Carryover<'_> {
    fn take(&mut self, name: &'static str) -> Option<Box<dyn Widget>> {
        let pos = self.widgets.iter().position(|w| w.name() == name)?;
        Some(self.widgets.remove(pos))
    }
}

/// Builds the screen list for `config`.
///
/// In multi-screen mode each configured screen becomes a [`Screen`]; screens
/// whose widgets are all unknown are dropped.  In single-screen mode every
/// enabled widget is stacked on one screen.
pub fn build_screens(config: &DashboardConfig, factory: &dyn WidgetFactory) -> ScreenManager {
    assemble_screens(config, factory, None)
}

fn assemble_screens(
    config: &DashboardConfig,
    factory: &dyn WidgetFactory,
    mut carryover: Option<Carryover<'_>>,
) -> ScreenManager {
    let mut kept = 0usize;
    let mut build_all = |names: &[String]| -> Vec<Box<dyn Widget>> {
        names
            .iter()
            .filter_map(|name| {
                let Some(widget) = factory.build(name, config) else {
                    warn!("unknown widget {name:?} ignored");
                    return None;
                };
                let reused = carryover
                    .as_mut()
                    .filter(|c| !factory.needs_rebuild(name, c.previous, config))
                    .and_then(|c| c.take(widget.name()));
                match reused {
                    Some(old) => {
                        kept += 1;
                        Some(old)
                    }
                    None => Some(widget),
                }
            })
            .collect()
    };

    let manager = if !config.display.multi_screen_mode {
        let widgets = build_all(&config.widgets);
        info!("single-screen mode: {} widgets", widgets.len());
        ScreenManager::new(vec![Screen::new("main", widgets)])
    } else {
        let screens: Vec<Screen> = config
            .screen_configs()
            .into_iter()
            .filter_map(|sc| {
                let widgets = build_all(&sc.widgets);
                if widgets.is_empty() {
                    warn!(screen = %sc.name, "screen has no usable widgets, skipped");
                    None
                } else {
                    debug!(screen = %sc.name, widgets = widgets.len(), "screen created");
                    Some(Screen::new(sc.name, widgets))
                }
            })
            .collect();
        info!("multi-screen mode: {} screens", screens.len());
        ScreenManager::new(screens)
    };
    if kept > 0 {
        debug!(kept, "widgets carried over from previous configuration");
    }
    manager
}

/// The running dashboard.
pub struct Dashboard {
    config: DashboardConfig,
    config_path: Option<PathBuf>,
    factory: Arc<dyn WidgetFactory>,
    screens: ScreenManager,
    driver: DisplayDriver,
    frame: Frame,
    pushed: bool,
    cycles: u64,
    ignored_display: Option<DisplayConfig>,
}

impl Dashboard {
    /// Creates a dashboard for `config`.
    ///
    /// When `config_path` is set the file is re-read at the start of every
    /// cycle after the first.
    pub fn new(
        config: DashboardConfig,
        config_path: Option<PathBuf>,
        factory: Arc<dyn WidgetFactory>,
        driver: DisplayDriver,
    ) -> Self {
        let (width, height) = config.display_size();
        let screens = build_screens(&config, factory.as_ref());
        Self {
            config,
            config_path,
            factory,
            screens,
            driver,
            frame: Frame::new(width, height),
            pushed: false,
            cycles: 0,
            ignored_display: None,
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn screens(&self) -> &ScreenManager {
        &self.screens
    }

    pub fn screens_mut(&mut self) -> &mut ScreenManager {
        &mut self.screens
    }

    /// The most recently rendered frame.
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Re-reads the configuration file.
    ///
    /// Nothing is rebuilt when the document is unchanged.  Otherwise the
    /// screens are rebuilt, reusing every widget whose section did not
    /// change; the current screen is kept when a screen of the same name
    /// still exists.  Display
    /// geometry and backend are fixed for the life of the process, so
    /// changes to the `display` section are logged and ignored.  A file that
    /// fails to load keeps the current configuration.
    ///
    /// Returns `true` when the screens were rebuilt.
    pub async fn reload_config(&mut self) -> bool {
        let Some(path) = &self.config_path else {
            return false;
        };
        let mut fresh = match read_config(path).await {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("could not reload configuration, keeping current settings: {e}");
                return false;
            }
        };

        if fresh.display != self.config.display {
            if self.ignored_display.as_ref() != Some(&fresh.display) {
                warn!("display settings changed on disk; restart inkdash to apply them");
                self.ignored_display = Some(fresh.display.clone());
            }
            fresh.display = self.config.display.clone();
        }
        if fresh == self.config {
            return false;
        }

        let current = self.screens.current().map(|s| s.name().to_string());
        let previous = std::mem::replace(&mut self.config, fresh);
        let carryover = Carryover {
            previous: &previous,
            widgets: std::mem::take(&mut self.screens).into_widgets(),
        };
        self.screens = assemble_screens(&self.config, self.factory.as_ref(), Some(carryover));
        if let Some(name) = current {
            self.screens.go_to_named(&name);
        }
        info!("configuration reloaded");
        true
    }

    /// Clears the frame and draws the current screen into it.
    pub fn render(&mut self) -> &Frame {
        self.frame.clear();
        let mut canvas = Canvas::new(&mut self.frame);
        self.screens.render(&mut canvas);
        &self.frame
    }

    fn push(&mut self) -> Result<(), DisplayError> {
        self.render();
        let mode = if self.pushed {
            RefreshMode::Partial
        } else {
            RefreshMode::Full
        };
        self.driver.show(&self.frame, mode)?;
        self.pushed = true;
        Ok(())
    }

    /// Runs one refresh cycle: reload, rotate, update, render, push.
    ///
    /// # Errors
    ///
    /// Returns [`DisplayError`] only when the panel rejects the frame; widget
    /// failures are logged and never abort the cycle.
    pub async fn run_cycle(&mut self) -> Result<(), DisplayError> {
        if self.cycles > 0 {
            self.reload_config().await;
            if self.config.display.multi_screen_mode && self.config.display.rotate_screens {
                self.screens.next();
            }
        }
        self.cycles += 1;

        let Some(screen) = self.screens.current_mut() else {
            warn!("no screens configured, nothing to draw");
            return self.push();
        };
        let updated = screen.update_all().await;
        info!(screen = screen.name(), updated, "refresh cycle");
        self.push()
    }

    /// Redraws the current screen if it shows a clock.
    ///
    /// Returns `true` when a partial refresh was pushed.
    ///
    /// # Errors
    ///
    /// Returns [`DisplayError`] when the panel rejects the frame.
    pub async fn tick_clock(&mut self) -> Result<bool, DisplayError> {
        let Some(screen) = self.screens.current_mut() else {
            return Ok(false);
        };
        if !screen.shows_time() {
            return Ok(false);
        }
        screen.update_time_widgets().await;
        self.render();
        self.driver.show(&self.frame, RefreshMode::Partial)?;
        self.pushed = true;
        debug!("clock tick pushed");
        Ok(true)
    }

    /// Puts the panel to sleep.
    ///
    /// # Errors
    ///
    /// Propagates the panel's error.
    pub fn shutdown(&mut self) -> Result<(), DisplayError> {
        info!("shutting down dashboard");
        self.driver.sleep()
    }

    /// Initialises the panel, runs a single cycle, and puts the panel to sleep.
    ///
    /// # Errors
    ///
    /// Returns the first display error encountered.
    pub async fn run_once(&mut self) -> Result<(), DisplayError> {
        self.driver.init(RefreshMode::Full)?;
        let result = self.run_cycle().await;
        self.shutdown()?;
        result
    }

    /// Runs the polling loop until `running` is cleared.
    ///
    /// The loop sleeps in chunks of at most one second so a shutdown request
    /// is honoured promptly.  Display errors inside the loop are logged and
    /// retried on the next cycle.
    ///
    /// # Errors
    ///
    /// Returns an error if the panel cannot be initialised or put to sleep.
    pub async fn run(&mut self, running: Arc<AtomicBool>) -> Result<(), DisplayError> {
        self.driver.init(RefreshMode::Full)?;
        if let Err(e) = self.run_cycle().await {
            error!("refresh cycle failed: {e}");
        }

        let mut last_refresh = Instant::now();
        let mut last_tick = last_refresh;

        while running.load(Ordering::Relaxed) {
            let now = Instant::now();
            let refresh_due = last_refresh + self.config.refresh_interval();

            if now >= refresh_due {
                if let Err(e) = self.run_cycle().await {
                    error!("refresh cycle failed: {e}");
                }
                last_refresh = Instant::now();
                last_tick = last_refresh;
                continue;
            }

            if now >= last_tick + self.config.clock_update_interval() {
                if let Err(e) = self.tick_clock().await {
                    error!("clock tick failed: {e}");
                }
                last_tick = Instant::now();
                continue;
            }

            let remaining = (refresh_due - now).min(MAX_SLEEP);
            tokio::time::sleep(remaining).await;
        }

        self.shutdown()
    }
}
