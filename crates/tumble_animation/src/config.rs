//! Scheduler configuration (tumble.toml)

use crate::error::{AnimationError, Result};
use serde::{Deserialize, Serialize};

/// Scheduler configuration
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct SchedulerConfig {
    /// Slots reserved up front for top-level units
    #[serde(default = "default_initial_capacity")]
    pub initial_capacity: usize,
    /// Multiplier applied to every delta before dispatch
    #[serde(default = "default_time_scale")]
    pub time_scale: f32,
    /// Clamp for the magnitude of a single delta, to ride out frame hitches
    #[serde(default)]
    pub max_delta: Option<f32>,
    #[serde(default)]
    pub pool: PoolConfig,
}

fn default_initial_capacity() -> usize {
    64
}

fn default_time_scale() -> f32 {
    1.0
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            initial_capacity: default_initial_capacity(),
            time_scale: default_time_scale(),
            max_delta: None,
            pool: PoolConfig::default(),
        }
    }
}

impl SchedulerConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.time_scale.is_finite() {
            return Err(AnimationError::invalid(format!(
                "time_scale must be finite, got {}",
                self.time_scale
            )));
        }
        if let Some(max) = self.max_delta {
            if !max.is_finite() || max <= 0.0 {
                return Err(AnimationError::invalid(format!(
                    "max_delta must be positive and finite, got {max}"
                )));
            }
        }
        Ok(())
    }

    /// Apply time scale and clamping to a raw frame delta
    pub fn effective_delta(&self, delta: f32) -> f32 {
        let scaled = delta * self.time_scale;
        match self.max_delta {
            Some(max) => scaled.clamp(-max, max),
            None => scaled,
        }
    }
}

/// Object pool configuration
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct PoolConfig {
    /// Maximum tweens kept on the free list
    #[serde(default = "default_pool_capacity")]
    pub capacity: usize,
}

fn default_pool_capacity() -> usize {
    256
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            capacity: default_pool_capacity(),
        }
    }
}
