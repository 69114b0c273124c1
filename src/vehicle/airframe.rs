use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::dynamics::state::{Rotor, G0};
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Airframe: the fixed physical constants of one quadrotor
// ---------------------------------------------------------------------------

/// Rotor hub positions relative to the centre of mass, body frame, m.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RotorOffsets {
    pub ne: Vector3<f64>,
    pub nw: Vector3<f64>,
    pub se: Vector3<f64>,
    pub sw: Vector3<f64>,
}

impl RotorOffsets {
    /// X layout with hubs at (±d, ±d, 0).
    pub fn square(d: f64) -> Self {
        Self {
            ne: Vector3::new(d, -d, 0.0),
            nw: Vector3::new(d, d, 0.0),
            se: Vector3::new(-d, -d, 0.0),
            sw: Vector3::new(-d, d, 0.0),
        }
    }

    pub fn get(&self, rotor: Rotor) -> Vector3<f64> {
        match rotor {
            Rotor::Ne => self.ne,
            Rotor::Nw => self.nw,
            Rotor::Se => self.se,
            Rotor::Sw => self.sw,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Airframe {
    pub mass: f64,                    // kg
    pub gravity: f64,                 // m/s^2
    pub rotor_offsets: RotorOffsets,
    pub k_thrust: f64,                // N / (rad/s)^2,   F = k * w^2
    pub k_reaction: f64,              // N·m / (rad/s)^2, M = k * w^2
    pub linear_drag: Vector3<f64>,    // per body axis, F = -k * v|v|
    pub angular_drag: Vector3<f64>,   // per body axis, M = -k * w|w|
    pub w_min: f64,                   // rad/s
    pub w_max: f64,                   // rad/s
}

impl Airframe {
    pub fn weight(&self) -> f64 {
        self.mass * self.gravity
    }

    /// Common rotor speed at which total thrust equals weight.
    pub fn hover_speed(&self) -> f64 {
        (self.weight() / (4.0 * self.k_thrust)).sqrt()
    }

    /// Thrust of all four rotors at `w_max`.
    pub fn max_thrust(&self) -> f64 {
        4.0 * self.k_thrust * self.w_max * self.w_max
    }

    /// Thrust-to-weight ratio at full speed.
    pub fn twr(&self) -> f64 {
        self.max_thrust() / self.weight()
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("mass", self.mass),
            ("gravity", self.gravity),
            ("k_thrust", self.k_thrust),
        ];
        for (name, v) in positive {
            if !(v.is_finite() && v > 0.0) {
                return Err(Error::InvalidConfig(format!("airframe.{name} must be > 0, got {v}")));
            }
        }
        if !(self.k_reaction.is_finite() && self.k_reaction >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "airframe.k_reaction must be >= 0, got {}",
                self.k_reaction
            )));
        }
        if self.linear_drag.iter().chain(self.angular_drag.iter()).any(|k| !(k.is_finite() && *k >= 0.0)) {
            return Err(Error::InvalidConfig("airframe drag coefficients must be >= 0".into()));
        }
        if !(self.w_min >= 0.0 && self.w_min < self.w_max && self.w_max.is_finite()) {
            return Err(Error::InvalidConfig(format!(
                "airframe rotor bounds must satisfy 0 <= w_min < w_max, got [{}, {}]",
                self.w_min, self.w_max
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Airframe builder
// ---------------------------------------------------------------------------

pub struct AirframeBuilder {
    mass: f64,
    gravity: f64,
    rotor_offsets: RotorOffsets,
    k_thrust: f64,
    k_reaction: f64,
    linear_drag: Vector3<f64>,
    angular_drag: Vector3<f64>,
    w_min: f64,
    w_max: f64,
}

impl AirframeBuilder {
    pub fn new() -> Self {
        Self {
            mass: 1.0,
            gravity: G0,
            rotor_offsets: RotorOffsets::square(0.1),
            k_thrust: 1.0e-5,
            k_reaction: 2.0e-7,
            linear_drag: Vector3::zeros(),
            angular_drag: Vector3::zeros(),
            w_min: 0.0,
            w_max: 1000.0,
        }
    }

    pub fn mass(mut self, v: f64) -> Self { self.mass = v; self }
    pub fn gravity(mut self, v: f64) -> Self { self.gravity = v; self }
    /// X layout, hubs `v` metres from the centre at 45 deg off the axes.
    pub fn arm_length(mut self, v: f64) -> Self {
        self.rotor_offsets = RotorOffsets::square(v * std::f64::consts::FRAC_1_SQRT_2);
        self
    }
    pub fn rotor_offsets(mut self, v: RotorOffsets) -> Self { self.rotor_offsets = v; self }
    pub fn k_thrust(mut self, v: f64) -> Self { self.k_thrust = v; self }
    pub fn k_reaction(mut self, v: f64) -> Self { self.k_reaction = v; self }
    pub fn linear_drag(mut self, v: Vector3<f64>) -> Self { self.linear_drag = v; self }
    pub fn angular_drag(mut self, v: Vector3<f64>) -> Self { self.angular_drag = v; self }
    pub fn rotor_bounds(mut self, w_min: f64, w_max: f64) -> Self {
        self.w_min = w_min;
        self.w_max = w_max;
        self
    }

    pub fn build(self) -> Airframe {
        Airframe {
            mass: self.mass,
            gravity: self.gravity,
            rotor_offsets: self.rotor_offsets,
            k_thrust: self.k_thrust,
            k_reaction: self.k_reaction,
            linear_drag: self.linear_drag,
            angular_drag: self.angular_drag,
            w_min: self.w_min,
            w_max: self.w_max,
        }
    }
}

impl Default for AirframeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Preset airframes
// ---------------------------------------------------------------------------

pub mod presets {
    use super::*;

    /// 0.6 kg indoor minidrone, 15000 rpm motors, hubs 7.5 cm off each axis.
    pub fn minidrone() -> Airframe {
        AirframeBuilder::new()
            .mass(0.595)
            .gravity(G0)
            .rotor_offsets(RotorOffsets::square(0.075))
            .k_thrust(1.7179e-05)
            .k_reaction(3.6714e-08)
            .linear_drag(Vector3::new(1.1902e-04, 1.1902e-04, 36.4437e-4))
            .angular_drag(Vector3::new(1.1078e-04, 1.1078e-04, 7.8914e-05))
            .rotor_bounds(0.0, 628.3185)
            .build()
    }
}
