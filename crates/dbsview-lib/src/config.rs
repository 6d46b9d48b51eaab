use crate::error::{Error, Result};
use crate::filters::DEFAULT_ORDER;
use crate::io::dbs::DEFAULT_SAMPLING_RATE;
use crate::montage::builder::MontageConfig;
use crate::view::{WindowLength, DEFAULT_SHIFT_STEP_S};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Viewer settings. Every table and field is optional in the TOML file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub montage: MontageConfig,
    pub view: ViewConfig,
    pub filter: FilterConfig,
    pub dbs: DbsConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub window_length_s: WindowLength,
    pub shift_step_s: f64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            window_length_s: WindowLength::default(),
            shift_step_s: DEFAULT_SHIFT_STEP_S,
        }
    }
}

/// Band applied when filtering is switched on without explicit cutoffs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub lowcut_hz: f64,
    pub highcut_hz: f64,
    pub order: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            lowcut_hz: 1.0,
            highcut_hz: 50.0,
            order: DEFAULT_ORDER,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbsConfig {
    /// Used when the DBS file carries no `sampling_rate`.
    pub default_sampling_rate: f64,
}

impl Default for DbsConfig {
    fn default() -> Self {
        Self {
            default_sampling_rate: DEFAULT_SAMPLING_RATE,
        }
    }
}

pub fn parse_config(text: &str) -> Result<ViewerConfig> {
    toml::from_str(text).map_err(|err| Error::malformed("viewer config", err))
}

pub fn read_config(path: &Path) -> Result<ViewerConfig> {
    let contents = fs::read_to_string(path)?;
    toml::from_str(&contents).map_err(|err| Error::malformed(path.display().to_string(), err))
}
