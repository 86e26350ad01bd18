//! CLI configuration file
//!
//! Display settings live under `[display]` and are the driver's
//! [`DisplayConfig`]; `[bus]` says where the backpack is attached.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use charlcd_driver::DisplayConfig;
use charlcd_hal::linux::DEFAULT_BUS_PATH;
use serde::Deserialize;

/// Where the backpack is attached
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BusConfig {
    /// `i2c-dev` device node
    pub path: PathBuf,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_BUS_PATH),
        }
    }
}

/// Complete `charlcd` configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub bus: BusConfig,
    pub display: DisplayConfig,
}

impl AppConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s).context("invalid configuration")?;
        config.display.validate()?;
        Ok(config)
    }

    /// Read `path`, or fall back to defaults when no file was given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("in {}", path.display()))
    }
}
