//! Threaded 16x2 character LCD driver
//!
//! Drives an HD44780 through a PCF8574 I2C backpack. Application threads
//! hand text to an [`LcdDisplay`]; a dedicated render thread owns the bus,
//! redraws both lines every tick and scrolls lines wider than the panel.
//!
//! ```no_run
//! use charlcd_driver::{DisplayConfig, LcdDisplay};
//! use charlcd_driver::sim::{NoopDelay, SimulatedPanel};
//!
//! let config = DisplayConfig::default();
//! let panel = SimulatedPanel::new(config.address);
//! let display = LcdDisplay::create(panel, NoopDelay, &config);
//!
//! display.print("Living room", 0);
//! display.print("21.4 C  45 %RH  (updated 12:04)", 1);
//!
//! let _bus = display.destroy();
//! ```

pub mod config;
pub mod display;
mod render;
pub mod sim;

pub use charlcd_core::{Line, ScrollMode, Timing};
pub use config::{ConfigError, DisplayConfig};
pub use display::LcdDisplay;
