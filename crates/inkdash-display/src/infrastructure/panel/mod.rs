//! Panel backends.
//!
//! | Backend                        | `display.backend` | Output                                  |
//! |--------------------------------|-------------------|-----------------------------------------|
//! | [`simulated::SimulatedPanel`]  | `simulation`      | binary PBM image at `display.output_path` |
//! | [`raw::RawPanel`]              | `raw`             | packed 1-bpp buffer at `display.device_path` |
//! | [`mock::MockPanel`]            | (tests only)      | records calls in memory                 |
//!
//! The simulation backend is the default so the dashboard can run on any
//! machine; open the PBM with any image viewer to see what the panel would
//! show.

pub mod mock;
pub mod raw;
pub mod simulated;

use inkdash_core::domain::config::DisplayConfig;
use inkdash_core::DisplayBackend;

use crate::application::display::Panel;

/// Creates the backend selected by `config.backend`.
pub fn build_panel(config: &DisplayConfig) -> Box<dyn Panel> {
    match config.backend {
        DisplayBackend::Simulation => Box::new(simulated::SimulatedPanel::new(&config.output_path)),
        DisplayBackend::Raw => Box::new(raw::RawPanel::new(
            &config.device_path,
            config.panel_width,
            config.panel_height,
        )),
    }
}
