use nalgebra::{Quaternion, UnitQuaternion, Vector3};

use crate::dynamics::state::VehicleMotion;
use crate::vehicle::Airframe;
use super::integrator::rk4_step;

// ---------------------------------------------------------------------------
// Physics engine interface
// ---------------------------------------------------------------------------

/// What the autopilot needs from a physics engine.
///
/// The engine owns pose, velocity and time. The autopilot reads them once per
/// tick and hands back body-frame loads; integration happens elsewhere.
pub trait RigidBody {
    /// Current simulation time, s.
    fn sim_time(&self) -> f64;

    fn motion(&self) -> VehicleMotion;

    /// Body-frame force applied at a body-frame offset from the centre of mass.
    fn add_force_at(&mut self, force: Vector3<f64>, offset: Vector3<f64>);

    /// Body-frame torque about the centre of mass.
    fn add_torque(&mut self, torque: Vector3<f64>);
}

// ---------------------------------------------------------------------------
// Reference rigid body
// ---------------------------------------------------------------------------

/// Mass, principal inertia and gravity of a free body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MassProperties {
    pub mass: f64,              // kg
    pub inertia: Vector3<f64>,  // kg·m^2, principal axes
    pub gravity: f64,           // m/s^2, along world -z
}

impl MassProperties {
    /// Mass and gravity from the airframe, inertia of a 0.6 kg X-frame.
    pub fn minidrone(airframe: &Airframe) -> Self {
        Self {
            mass: airframe.mass,
            inertia: Vector3::new(0.003, 0.003, 0.006),
            gravity: airframe.gravity,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BodyState {
    pub time: f64,
    pub pos: Vector3<f64>,         // m, world
    pub vel: Vector3<f64>,         // m/s, world
    pub quat: UnitQuaternion<f64>, // body→world rotation
    pub omega: Vector3<f64>,       // rad/s, body frame
}

impl BodyState {
    pub fn at_rest(pos: Vector3<f64>) -> Self {
        Self {
            time: 0.0,
            pos,
            vel: Vector3::zeros(),
            quat: UnitQuaternion::identity(),
            omega: Vector3::zeros(),
        }
    }

    pub fn apply(&self, d: &BodyDeriv, dt: f64) -> BodyState {
        let q_raw = self.quat.quaternion() + d.dquat * dt;
        BodyState {
            time: self.time + dt,
            pos: self.pos + d.dpos * dt,
            vel: self.vel + d.dvel * dt,
            quat: UnitQuaternion::new_normalize(q_raw),
            omega: self.omega + d.domega * dt,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BodyDeriv {
    pub dpos: Vector3<f64>,
    pub dvel: Vector3<f64>,
    pub dquat: Quaternion<f64>, // raw, not unit
    pub domega: Vector3<f64>,
}

/// Body-frame force and torque about the centre of mass.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Wrench {
    pub force: Vector3<f64>,
    pub torque: Vector3<f64>,
}

/// Rigid-body derivatives under a wrench held constant over the step.
///
///   dv = q·F/m + g
///   I·dω = τ − ω × (I·ω)
///   dq = ½ q ⊗ ω
pub fn derivatives(state: &BodyState, props: &MassProperties, wrench: &Wrench) -> BodyDeriv {
    let accel = state.quat * wrench.force / props.mass + Vector3::new(0.0, 0.0, -props.gravity);

    let i = props.inertia;
    let w = state.omega;
    let iw = Vector3::new(i.x * w.x, i.y * w.y, i.z * w.z);
    let t = wrench.torque;
    let domega = Vector3::new(
        (t.x - (w.y * iw.z - w.z * iw.y)) / i.x,
        (t.y - (w.z * iw.x - w.x * iw.z)) / i.y,
        (t.z - (w.x * iw.y - w.y * iw.x)) / i.z,
    );

    let omega_quat = Quaternion::new(0.0, w.x, w.y, w.z);
    let dquat = state.quat.quaternion() * omega_quat * 0.5;

    BodyDeriv { dpos: state.vel, dvel: accel, dquat, domega }
}

/// Minimal 6DOF body standing in for an external physics engine.
///
/// Loads accumulate between steps and are cleared by [`FreeBody::step`].
/// The ground is the plane z = 0: the body cannot sink below it and stops
/// dead when it lands.
#[derive(Debug, Clone)]
pub struct FreeBody {
    state: BodyState,
    props: MassProperties,
    wrench: Wrench,
}

impl FreeBody {
    pub fn new(props: MassProperties, pos: Vector3<f64>) -> Self {
        Self { state: BodyState::at_rest(pos), props, wrench: Wrench::default() }
    }

    pub fn state(&self) -> &BodyState {
        &self.state
    }

    pub fn wrench(&self) -> &Wrench {
        &self.wrench
    }

    /// Move the clock, as a world reset does. Pose is untouched.
    pub fn set_time(&mut self, time: f64) {
        self.state.time = time;
    }

    pub fn step(&mut self, dt: f64) {
        let wrench = std::mem::take(&mut self.wrench);
        self.state = rk4_step(&self.state, &self.props, &wrench, dt);

        if self.state.pos.z <= 0.0 {
            self.state.pos.z = 0.0;
            if self.state.vel.z < 0.0 {
                self.state.vel = Vector3::zeros();
                self.state.omega = Vector3::zeros();
            }
        }
    }
}

impl RigidBody for FreeBody {
    fn sim_time(&self) -> f64 {
        self.state.time
    }

    fn motion(&self) -> VehicleMotion {
        let (roll, pitch, yaw) = self.state.quat.euler_angles();
        VehicleMotion {
            pos: self.state.pos,
            roll,
            pitch,
            yaw,
            vel: self.state.quat.inverse() * self.state.vel,
            omega: self.state.omega,
        }
    }

    fn add_force_at(&mut self, force: Vector3<f64>, offset: Vector3<f64>) {
        self.wrench.force += force;
        self.wrench.torque += offset.cross(&force);
    }

    fn add_torque(&mut self, torque: Vector3<f64>) {
        self.wrench.torque += torque;
    }
}
