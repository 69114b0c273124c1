use nalgebra::Vector3;

use crate::dynamics::state::{Rotor, RotorCommand, VehicleMotion};
use crate::physics::aerodynamics::{quadratic_drag, rotor_reaction, rotor_thrust};
use crate::sim::body::RigidBody;
use crate::vehicle::Airframe;

// ---------------------------------------------------------------------------
// Forces and torques produced by the rotors and the airframe
// ---------------------------------------------------------------------------

/// A body-frame force applied at a body-frame offset from the centre of mass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AppliedForce {
    pub force: Vector3<f64>,
    pub offset: Vector3<f64>,
}

/// Everything the dynamics model hands to the physics engine for one tick.
/// All vectors are in the body frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceSet {
    /// Rotor thrust, one application point per rotor (NE, NW, SE, SW)
    pub thrust: [AppliedForce; 4],
    /// Net rotor reaction torque, z only
    pub reaction_torque: Vector3<f64>,
    /// Air drag at the centre of mass
    pub drag_force: Vector3<f64>,
    /// Air drag opposing rotation
    pub drag_torque: Vector3<f64>,
}

impl ForceSet {
    /// Resultant force at the centre of mass.
    pub fn net_force(&self) -> Vector3<f64> {
        self.thrust.iter().map(|t| t.force).sum::<Vector3<f64>>() + self.drag_force
    }

    /// Resultant torque about the centre of mass, including the moment of
    /// each off-centre thrust.
    pub fn net_torque(&self) -> Vector3<f64> {
        let thrust_moment: Vector3<f64> = self
            .thrust
            .iter()
            .map(|t| t.offset.cross(&t.force))
            .sum();
        thrust_moment + self.reaction_torque + self.drag_torque
    }

    /// Hand every contribution to the physics engine. No integration here.
    pub fn apply_to(&self, body: &mut dyn RigidBody) {
        for t in &self.thrust {
            body.add_force_at(t.force, t.offset);
        }
        body.add_torque(self.reaction_torque);
        body.add_force_at(self.drag_force, Vector3::zeros());
        body.add_torque(self.drag_torque);
    }
}

/// Compute rotor and aerodynamic loads for the given rotor speeds and motion.
///
/// Contributions:
///   1. Thrust per rotor, `k_thrust * w^2` along body z, at the rotor hub
///   2. Rotor reaction torque about z, NE/SW against NW/SE (yaw actuation)
///   3. Quadratic linear drag at the centre of mass
///   4. Quadratic angular drag
///
/// Pure: identical inputs give identical outputs.
pub fn forces(airframe: &Airframe, rotors: &RotorCommand, motion: &VehicleMotion) -> ForceSet {
    let thrust = Rotor::ALL.map(|r| AppliedForce {
        force: rotor_thrust(airframe.k_thrust, rotors.speed(r)),
        offset: airframe.rotor_offsets.get(r),
    });

    let yaw: f64 = Rotor::ALL
        .iter()
        .map(|&r| r.reaction_sign() * rotor_reaction(airframe.k_reaction, rotors.speed(r)))
        .sum();

    ForceSet {
        thrust,
        reaction_torque: Vector3::new(0.0, 0.0, yaw),
        drag_force: quadratic_drag(&motion.vel, &airframe.linear_drag),
        drag_torque: quadratic_drag(&motion.omega, &airframe.angular_drag),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
