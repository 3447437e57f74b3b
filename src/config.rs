//! Driver configuration, loaded from a TOML file.

use std::{fs, path::PathBuf};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Cannot read configuration file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Error parsing configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Rate must be positive, got {0} Hz")]
    BadRate(f64),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub source: SourceConfig,

    #[serde(default)]
    pub driver: DriverConfig,
}

/// Where navigation samples come from.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum SourceConfig {
    /// Live device socket delivering fixed-format navigation records.
    Live { address: String },

    /// Recorded capture in CSV form, replayed one record per poll.
    Capture { path: PathBuf },

    /// Free-running synthetic fix at a constant location, for bench runs
    /// without hardware.
    Synthetic {
        lat_deg: f64,
        lon_deg: f64,
        #[serde(default = "default_rate_hz")]
        rate_hz: f64,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Cycle rate of the acquire/publish loop, in Hz.
    pub rate_hz: f64,

    /// Ring capacity used by in-process subscribers of the outbound channels.
    pub queue_depth: usize,

    /// Reference frame of published poses.
    pub frame: String,

    /// Body frame of the vehicle.
    pub child_frame: String,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            rate_hz: default_rate_hz(),
            queue_depth: 1,
            frame: "odom".to_string(),
            child_frame: "vehicle".to_string(),
        }
    }
}

fn default_rate_hz() -> f64 {
    20.0
}

impl Config {
    pub fn load(path: &PathBuf) -> Result<Self, Error> {
        let contents = fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.clone(),
            source,
        })?;

        let config: Self = toml::from_str(&contents)?;
        config.validate()
    }

    /// Bounds checks that deserialization cannot express. A zero or negative
    /// rate has no meaningful cycle period; a zero queue depth is clamped to
    /// the single-slot minimum.
    pub fn validate(mut self) -> Result<Self, Error> {
        if !(self.driver.rate_hz > 0.0) {
            return Err(Error::BadRate(self.driver.rate_hz));
        }

        if let SourceConfig::Synthetic { rate_hz, .. } = self.source
            && !(rate_hz > 0.0)
        {
            return Err(Error::BadRate(rate_hz));
        }

        self.driver.queue_depth = self.driver.queue_depth.max(1);

        Ok(self)
    }
}
