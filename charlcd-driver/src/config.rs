//! Display configuration
//!
//! Loaded from TOML. Every field has a default, so an empty file (or no file
//! at all) gives a PCF8574 backpack at 0x27 with datasheet timing:
//!
//! ```toml
//! address = 0x27
//! tick_ms = 500
//! scroll = "rollback"
//!
//! [timing]
//! settle_us = 2000
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use charlcd_core::{ScrollMode, Timing};
use charlcd_hal::i2c::PCF8574_DEFAULT_ADDR;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default render tick
pub const DEFAULT_TICK_MS: u64 = 500;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// TOML syntax or type error
    #[error("invalid display config: {0}")]
    Parse(#[from] toml::de::Error),
    /// Values parsed but out of range
    #[error("invalid display config: {0}")]
    Invalid(&'static str),
}

/// Display driver configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DisplayConfig {
    /// 7-bit I2C address of the backpack
    pub address: u8,
    /// Render tick in milliseconds (redraw and scroll cadence)
    pub tick_ms: u64,
    /// Presentation of lines wider than the panel
    pub scroll: ScrollMode,
    /// Bus timing
    pub timing: Timing,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            address: PCF8574_DEFAULT_ADDR,
            tick_ms: DEFAULT_TICK_MS,
            scroll: ScrollMode::default(),
            timing: Timing::default(),
        }
    }
}

impl DisplayConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.address > 0x7F {
            return Err(ConfigError::Invalid("address must be a 7-bit I2C address"));
        }
        if self.tick_ms == 0 {
            return Err(ConfigError::Invalid("tick_ms must be greater than zero"));
        }
        Ok(())
    }

    /// Render tick as a [`Duration`]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}
