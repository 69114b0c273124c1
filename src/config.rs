//! Vehicle configuration.
//!
//! One immutable [`VehicleConfig`] carries everything the autopilot needs to
//! know about a vehicle: airframe constants, controller gains and the timing
//! of the periodic work. It is loaded from TOML or taken from a preset.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::vehicle::{airframe, gains, Airframe, ControlGains};

/// Periods and limits of the work done around the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timing {
    /// Telemetry publication period, s
    pub telemetry_period: f64,
    /// Inbound message poll period, s
    pub inbound_period: f64,
    /// How far ahead of `now` the navigator samples the route, s
    pub lookahead: f64,
    /// Validity of each navigator command, s
    pub command_duration: f64,
    /// Componentwise bound on remote velocity / yaw-rate commands
    pub remote_limit: f64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            telemetry_period: 1.0,
            inbound_period: 2.0,
            lookahead: 0.1,
            command_duration: 1.0,
            remote_limit: 4.0,
        }
    }
}

impl Timing {
    fn validate(&self) -> Result<()> {
        let positive = [
            ("telemetry_period", self.telemetry_period),
            ("inbound_period", self.inbound_period),
            ("command_duration", self.command_duration),
            ("remote_limit", self.remote_limit),
        ];
        for (name, v) in positive {
            if !(v.is_finite() && v > 0.0) {
                return Err(Error::InvalidConfig(format!("timing.{name} must be > 0, got {v}")));
            }
        }
        if !(self.lookahead.is_finite() && self.lookahead >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "timing.lookahead must be >= 0, got {}",
                self.lookahead
            )));
        }
        Ok(())
    }
}

/// Complete description of one vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleConfig {
    pub name: String,
    pub airframe: Airframe,
    pub gains: ControlGains,
    #[serde(default)]
    pub timing: Timing,
}

impl VehicleConfig {
    /// Load and validate a TOML config file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&content)?;
        log::info!("Loaded vehicle config '{}' from {}", config.name, path.as_ref().display());
        Ok(config)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.airframe.validate()?;
        self.gains.validate()?;
        self.timing.validate()?;
        if self.airframe.hover_speed() > self.airframe.w_max {
            return Err(Error::InvalidConfig(format!(
                "hover speed {:.1} rad/s exceeds w_max {:.1}",
                self.airframe.hover_speed(),
                self.airframe.w_max
            )));
        }
        Ok(())
    }

    /// Minidrone flying flight plans: wide integral clamp, rotors start at
    /// hover speed.
    pub fn minidrone() -> Self {
        Self {
            name: "minidrone".into(),
            airframe: airframe::presets::minidrone(),
            gains: gains::presets::minidrone(),
            timing: Timing::default(),
        }
    }

    /// Same airframe driven by the bare velocity autopilot: tight integral
    /// clamp, rotors start from rest.
    pub fn dc_autopilot() -> Self {
        Self {
            name: "dc-autopilot".into(),
            airframe: airframe::presets::minidrone(),
            gains: gains::presets::dc_autopilot(),
            timing: Timing::default(),
        }
    }
}
