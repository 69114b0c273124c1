use nalgebra::{Matrix4, SMatrix};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// State-feedback gain: 4 rotor outputs × 8 states.
pub type StateGain = SMatrix<f64, 4, 8>;

/// Integral gain: 4 rotor outputs × 4 tracked outputs.
pub type IntegralGain = Matrix4<f64>;

/// Rotor speed the controller reports before its first engaged tick and
/// after every reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InitialRotorSpeed {
    #[default]
    Zero,
    Hover,
}

// ---------------------------------------------------------------------------
// Control gains
// ---------------------------------------------------------------------------

/// Fixed gains of the state-feedback + integral controller.
///
/// Computed offline; this crate only consumes them. In config files the
/// matrices are written row by row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "GainRows", into = "GainRows")]
pub struct ControlGains {
    pub kx: StateGain,
    pub ky: IntegralGain,
    /// Symmetric clamp on each integral-error component
    pub e_max: f64,
    pub initial_rotor_speed: InitialRotorSpeed,
}

impl ControlGains {
    pub fn validate(&self) -> Result<()> {
        if self.kx.iter().chain(self.ky.iter()).any(|k| !k.is_finite()) {
            return Err(Error::InvalidConfig("gains must be finite".into()));
        }
        if !(self.e_max.is_finite() && self.e_max > 0.0) {
            return Err(Error::InvalidConfig(format!("gains.e_max must be > 0, got {}", self.e_max)));
        }
        Ok(())
    }

    pub fn with_e_max(mut self, e_max: f64) -> Self {
        self.e_max = e_max;
        self
    }

    pub fn with_initial_rotor_speed(mut self, v: InitialRotorSpeed) -> Self {
        self.initial_rotor_speed = v;
        self
    }
}

/// Row-major on-disk form of [`ControlGains`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GainRows {
    pub kx: [[f64; 8]; 4],
    pub ky: [[f64; 4]; 4],
    pub e_max: f64,
    #[serde(default)]
    pub initial_rotor_speed: InitialRotorSpeed,
}

impl From<GainRows> for ControlGains {
    fn from(rows: GainRows) -> Self {
        Self {
            kx: StateGain::from_fn(|r, c| rows.kx[r][c]),
            ky: IntegralGain::from_fn(|r, c| rows.ky[r][c]),
            e_max: rows.e_max,
            initial_rotor_speed: rows.initial_rotor_speed,
        }
    }
}

impl From<ControlGains> for GainRows {
    fn from(g: ControlGains) -> Self {
        let mut kx = [[0.0; 8]; 4];
        let mut ky = [[0.0; 4]; 4];
        for r in 0..4 {
            for c in 0..8 {
                kx[r][c] = g.kx[(r, c)];
            }
            for c in 0..4 {
                ky[r][c] = g.ky[(r, c)];
            }
        }
        Self { kx, ky, e_max: g.e_max, initial_rotor_speed: g.initial_rotor_speed }
    }
}

// ---------------------------------------------------------------------------
// Preset gains
// ---------------------------------------------------------------------------

pub mod presets {
    use super::*;

    /// LQI gains for the minidrone airframe.
    ///
    /// State order: roll, pitch, body wx, wy, wz, body vx, vy, vz.
    /// Output order: body vx, vy, vz, wz. Rotor order: NE, NW, SE, SW.
    pub fn minidrone() -> ControlGains {
        #[rustfmt::skip]
        let kx = StateGain::from_row_slice(&[
            -47.4820, -47.4820, -9.3626, -9.3626,  413.1508, -10.5091,  10.5091, 132.4440,
             47.4820, -47.4820,  9.3626, -9.3626, -413.1508, -10.5091, -10.5091, 132.4440,
            -47.4820,  47.4820, -9.3626,  9.3626, -413.1508,  10.5091,  10.5091, 132.4440,
             47.4820,  47.4820,  9.3626,  9.3626,  413.1508,  10.5091, -10.5091, 132.4440,
        ]);
        #[rustfmt::skip]
        let ky = IntegralGain::from_row_slice(&[
            -8.1889,  8.1889, 294.3201,  918.1130,
            -8.1889, -8.1889, 294.3201, -918.1130,
             8.1889,  8.1889, 294.3201, -918.1130,
             8.1889, -8.1889, 294.3201,  918.1130,
        ]);
        ControlGains {
            kx,
            ky,
            e_max: 5.0,
            initial_rotor_speed: InitialRotorSpeed::Hover,
        }
    }

    /// Same matrices, tighter integral clamp and a cold start, as flown by the
    /// bare velocity-command autopilot.
    pub fn dc_autopilot() -> ControlGains {
        minidrone()
            .with_e_max(1.0)
            .with_initial_rotor_speed(InitialRotorSpeed::Zero)
    }
}
