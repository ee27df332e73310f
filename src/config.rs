//! Construction-time options for the beeper and its processing stages.
//!
//! Both structs deserialise from the option objects a JavaScript host passes
//! (`{ updateHz: 64 }`), with every field optional.

use serde::{Deserialize, Serialize};

use crate::error::DosTuneError;

/// Rate at which the emulated PIT counter is reloaded, in Hz.
pub const DEFAULT_UPDATE_HZ: f64 = 64.0;

/// Time constant of the click-avoiding amplitude/frequency ramps, in seconds.
pub const DEFAULT_TRANSITION_SECONDS: f64 = 0.01;

/// Master output level.
pub const DEFAULT_VOLUME: f64 = 0.05;

fn default_update_hz() -> f64 {
    DEFAULT_UPDATE_HZ
}

fn default_transition_seconds() -> f64 {
    DEFAULT_TRANSITION_SECONDS
}

fn default_volume() -> f64 {
    DEFAULT_VOLUME
}

/// Options recognised by the `pit-quantizer` stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuantizerOptions {
    #[serde(default = "default_update_hz")]
    pub update_hz: f64,
}

impl Default for QuantizerOptions {
    fn default() -> Self {
        QuantizerOptions {
            update_hz: DEFAULT_UPDATE_HZ,
        }
    }
}

impl QuantizerOptions {
    /// Samples per quantization step at `sample_rate`. Never less than one.
    pub fn repeat_samples(&self, sample_rate: f64) -> usize {
        let samples = (sample_rate / self.update_hz).round();
        if samples.is_finite() && samples >= 1.0 {
            samples as usize
        } else {
            1
        }
    }
}

/// Settings for a beeper built on the native speaker engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeeperConfig {
    /// Update rate shared by the quantizer and the pitch-bend curve.
    #[serde(default = "default_update_hz")]
    pub update_hz: f64,
    #[serde(default = "default_transition_seconds")]
    pub transition_seconds: f64,
    #[serde(default = "default_volume")]
    pub volume: f64,
}

impl Default for BeeperConfig {
    fn default() -> Self {
        BeeperConfig {
            update_hz: DEFAULT_UPDATE_HZ,
            transition_seconds: DEFAULT_TRANSITION_SECONDS,
            volume: DEFAULT_VOLUME,
        }
    }
}

impl BeeperConfig {
    /// Check the settings against the engine's `sample_rate`. The update
    /// rate must fit at least one sample per step.
    pub fn validate(&self, sample_rate: f64) -> Result<(), DosTuneError> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(DosTuneError::InvalidConfig(format!(
                "sample rate must be positive and finite, got {sample_rate}"
            )));
        }
        if !(self.update_hz.is_finite() && self.update_hz > 0.0 && self.update_hz <= sample_rate) {
            return Err(DosTuneError::InvalidConfig(format!(
                "updateHz must be positive and at most the sample rate {sample_rate}, got {}",
                self.update_hz
            )));
        }
        if !(self.transition_seconds.is_finite() && self.transition_seconds >= 0.0) {
            return Err(DosTuneError::InvalidConfig(format!(
                "transitionSeconds must be non-negative and finite, got {}",
                self.transition_seconds
            )));
        }
        if !self.volume.is_finite() {
            return Err(DosTuneError::InvalidConfig(format!(
                "volume must be finite, got {}",
                self.volume
            )));
        }
        Ok(())
    }

    pub fn quantizer_options(&self) -> QuantizerOptions {
        QuantizerOptions {
            update_hz: self.update_hz,
        }
    }
}
