use nalgebra::{Rotation3, Vector3, Vector4};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Physical constants
// ---------------------------------------------------------------------------

pub const G0: f64 = 9.8; // gravity used by the airframe model, m/s^2

// ---------------------------------------------------------------------------
// Vehicle motion: what the physics engine reports each tick
// ---------------------------------------------------------------------------

/// Pose and rates of the vehicle at one instant.
///
/// Position is in the world frame. Linear and angular velocity are in the
/// body frame (x forward, y left, z up). Never mutated by the autopilot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VehicleMotion {
    pub pos: Vector3<f64>,   // m, world
    pub roll: f64,           // rad
    pub pitch: f64,          // rad
    pub yaw: f64,            // rad
    pub vel: Vector3<f64>,   // m/s, body
    pub omega: Vector3<f64>, // rad/s, body
}

impl VehicleMotion {
    /// Level, motionless vehicle at `pos`.
    pub fn at_rest(pos: Vector3<f64>) -> Self {
        Self {
            pos,
            roll: 0.0,
            pitch: 0.0,
            yaw: 0.0,
            vel: Vector3::zeros(),
            omega: Vector3::zeros(),
        }
    }

    /// Horizon → body rotation: undo roll, then pitch. Yaw is left out, it is
    /// tracked as a rate, not an attitude.
    pub fn horizon_to_body(&self) -> Rotation3<f64> {
        Rotation3::from_axis_angle(&Vector3::x_axis(), -self.roll)
            * Rotation3::from_axis_angle(&Vector3::y_axis(), -self.pitch)
    }
}

// ---------------------------------------------------------------------------
// Rotors
// ---------------------------------------------------------------------------

/// Rotor positions, in the fixed order used by the control vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rotor {
    Ne,
    Nw,
    Se,
    Sw,
}

impl Rotor {
    pub const ALL: [Rotor; 4] = [Rotor::Ne, Rotor::Nw, Rotor::Se, Rotor::Sw];

    /// Sign of this rotor's reaction torque about body z.
    /// Diagonal pairs spin the same way: NE/SW positive, NW/SE negative.
    pub fn reaction_sign(self) -> f64 {
        match self {
            Rotor::Ne | Rotor::Sw => 1.0,
            Rotor::Nw | Rotor::Se => -1.0,
        }
    }
}

/// Commanded rotor angular velocities, rad/s.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RotorCommand {
    pub ne: f64,
    pub nw: f64,
    pub se: f64,
    pub sw: f64,
}

impl RotorCommand {
    /// All motors stopped.
    pub const OFF: RotorCommand = RotorCommand { ne: 0.0, nw: 0.0, se: 0.0, sw: 0.0 };

    pub fn uniform(w: f64) -> Self {
        Self { ne: w, nw: w, se: w, sw: w }
    }

    /// Map a control vector `u = [NE, NW, SE, SW]`.
    pub fn from_vector(u: &Vector4<f64>) -> Self {
        Self { ne: u[0], nw: u[1], se: u[2], sw: u[3] }
    }

    pub fn to_vector(&self) -> Vector4<f64> {
        Vector4::new(self.ne, self.nw, self.se, self.sw)
    }

    pub fn speed(&self, rotor: Rotor) -> f64 {
        match rotor {
            Rotor::Ne => self.ne,
            Rotor::Nw => self.nw,
            Rotor::Se => self.se,
            Rotor::Sw => self.sw,
        }
    }

    pub fn is_off(&self) -> bool {
        *self == Self::OFF
    }
}

// ---------------------------------------------------------------------------
// Control reference: what the inner loop tracks
// ---------------------------------------------------------------------------

/// Desired horizon-frame velocity and yaw rate.
///
/// `active == false` means motors off; velocity and yaw rate are then ignored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlReference {
    pub active: bool,
    pub velocity: Vector3<f64>, // m/s, horizon frame
    pub yaw_rate: f64,          // rad/s
}

impl ControlReference {
    pub fn new(velocity: Vector3<f64>, yaw_rate: f64) -> Self {
        Self { active: true, velocity, yaw_rate }
    }

    pub fn off() -> Self {
        Self { active: false, velocity: Vector3::zeros(), yaw_rate: 0.0 }
    }

    /// Hold position: motors on, zero velocity, zero yaw rate.
    pub fn hover() -> Self {
        Self::new(Vector3::zeros(), 0.0)
    }

    /// Componentwise clamp of velocity and yaw rate to `±limit`. Non-finite
    /// components become zero.
    pub fn clamped(&self, limit: f64) -> Self {
        let bound = |v: f64| if v.is_finite() { v.clamp(-limit, limit) } else { 0.0 };
        Self {
            active: self.active,
            velocity: self.velocity.map(bound),
            yaw_rate: bound(self.yaw_rate),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.velocity.iter().all(|v| v.is_finite()) && self.yaw_rate.is_finite()
    }
}

impl Default for ControlReference {
    fn default() -> Self {
        Self::off()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn horizon_to_body_is_identity_when_level() {
        let m = VehicleMotion::at_rest(Vector3::zeros());
        let v = m.horizon_to_body() * Vector3::new(1.0, 2.0, 3.0);
        assert_relative_eq!(v, Vector3::new(1.0, 2.0, 3.0), epsilon = 1e-12);
    }

    #[test]
    fn horizon_to_body_ignores_yaw() {
        let mut m = VehicleMotion::at_rest(Vector3::zeros());
        m.yaw = 1.2;
        let v = m.horizon_to_body() * Vector3::new(2.0, 0.0, 0.0);
        assert_relative_eq!(v, Vector3::new(2.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn pitched_body_sees_forward_command_tilted() {
        let mut m = VehicleMotion::at_rest(Vector3::zeros());
        m.pitch = 0.1;
        let v = m.horizon_to_body() * Vector3::new(1.0, 0.0, 0.0);
        // Rotating the body nose-down by +pitch puts part of a horizontal
        // command onto body z.
        assert_relative_eq!(v.x, 0.1_f64.cos(), epsilon = 1e-12);
        assert_relative_eq!(v.z, 0.1_f64.sin(), epsilon = 1e-12);
    }

    #[test]
    fn clamp_is_componentwise() {
        let r = ControlReference::new(Vector3::new(9.0, -9.0, 1.0), -7.0).clamped(4.0);
        assert_eq!(r.velocity, Vector3::new(4.0, -4.0, 1.0));
        assert_eq!(r.yaw_rate, -4.0);
        assert!(r.active);
    }

    #[test]
    fn reaction_signs_cancel_in_pairs() {
        let sum: f64 = Rotor::ALL.iter().map(|r| r.reaction_sign()).sum();
        assert_eq!(sum, 0.0);
    }
}
