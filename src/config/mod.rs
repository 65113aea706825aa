// src/config/mod.rs
use crate::error::ConfigError;
use crate::filters::FilterSpec;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub band: BandConfig,
    pub processor: ProcessorConfig,
}

/// Band applied to every channel whenever the host reports new stream settings.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct BandConfig {
    pub order: usize,
    pub f_low: f64,
    pub f_high: f64,
}

impl Default for BandConfig {
    fn default() -> Self {
        Self {
            order: 2,
            f_low: 500.0,
            f_high: 2000.0,
        }
    }
}

impl BandConfig {
    pub fn to_spec(&self, sample_rate_hz: f64) -> FilterSpec {
        FilterSpec::new(self.order, self.f_low, self.f_high, sample_rate_hz)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ProcessorConfig {
    pub parallel_channels: bool,
    /// CSV file that instability events are appended to when acquisition stops.
    pub event_log: Option<PathBuf>,
}

impl Config {
    /// Checks what can be checked without a sample rate. The Nyquist bound is
    /// only known once the host reports stream settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let band = &self.band;
        if band.order == 0 {
            return Err(ConfigError::Invalid("band.order must be at least 1".into()));
        }
        if !(band.f_low.is_finite() && band.f_low > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "band.f_low must be a positive frequency, got {}",
                band.f_low
            )));
        }
        if !(band.f_high.is_finite() && band.f_high > band.f_low) {
            return Err(ConfigError::Invalid(format!(
                "band.f_high ({}) must be above band.f_low ({})",
                band.f_high, band.f_low
            )));
        }
        Ok(())
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let config_str = fs::read_to_string(path)?;
    let config: Config = serde_yaml::from_str(&config_str)?;
    config.validate()?;
    Ok(config)
}

pub fn save_config<P: AsRef<Path>>(config: &Config, path: P) -> Result<(), ConfigError> {
    let yaml = serde_yaml::to_string(config)?;
    fs::write(path, yaml)?;
    Ok(())
}
