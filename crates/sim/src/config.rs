use std::path::Path;

use farspace_stream::{FillerConfig, StreamConfig, StreamConfigError};
use serde::{Deserialize, Serialize};

/// Errors loading or validating a [`SimConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("stream config: {0}")]
    Stream(#[from] StreamConfigError),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level simulation settings. Every field has a default, so a config
/// file only needs the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub stream: StreamConfig,
    /// Camera view distance in world units.
    pub view_distance: f32,
    /// Fixed simulation steps per second.
    pub tick_rate: f64,
    pub filler: FillerConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            stream: StreamConfig::default(),
            view_distance: 10.0,
            tick_rate: 60.0,
            filler: FillerConfig::default(),
        }
    }
}

impl SimConfig {
    /// Parse and validate.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&data)?;
        tracing::info!(path = %path.display(), "loaded sim config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.stream.validate()?;
        if !(self.view_distance.is_finite() && self.view_distance > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "view_distance must be positive, got {}",
                self.view_distance
            )));
        }
        if !(self.tick_rate.is_finite() && self.tick_rate > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "tick_rate must be positive, got {}",
                self.tick_rate
            )));
        }
        let densities = [
            self.filler.dust_density,
            self.filler.junk_density,
            self.filler.far_junk_density,
            self.filler.asteroid_density,
        ];
        if densities.iter().any(|d| !(d.is_finite() && *d >= 0.0)) {
            return Err(ConfigError::Invalid("filler densities must be non-negative".into()));
        }
        Ok(())
    }

    /// Seconds per fixed step.
    pub fn tick_dt(&self) -> f64 {
        1.0 / self.tick_rate
    }
}
