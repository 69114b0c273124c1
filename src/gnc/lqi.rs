use nalgebra::{SVector, Vector4};

use crate::config::VehicleConfig;
use crate::dynamics::state::{ControlReference, RotorCommand, VehicleMotion};
use crate::sim::clock::{TimeGuard, TimeStep};
use crate::vehicle::{ControlGains, InitialRotorSpeed};

/// Controller state vector: roll, pitch, body wx, wy, wz, body vx, vy, vz.
pub type StateVector = SVector<f64, 8>;

// ---------------------------------------------------------------------------
// Controller state carried between ticks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ControllerState {
    /// State vector from the last engaged tick
    pub x: StateVector,
    /// Accumulated output error, each component within ±e_max
    pub integral: Vector4<f64>,
    /// Last rotor speeds (NE, NW, SE, SW). Seeded from `initial_rotor_speed`
    /// until the first engaged tick; never read back into the control law.
    pub u: Vector4<f64>,
    /// Timestamp of the previous engaged tick
    pub clock: TimeGuard,
    pub motors_engaged: bool,
}

impl ControllerState {
    fn new(u0: Vector4<f64>) -> Self {
        Self {
            x: StateVector::zeros(),
            integral: Vector4::zeros(),
            u: u0,
            clock: TimeGuard::new(),
            motors_engaged: false,
        }
    }
}

// ---------------------------------------------------------------------------
// State feedback + integral controller
// ---------------------------------------------------------------------------

/// Velocity / yaw-rate tracker linearised about hover:
///
///   u = Hs - Kx·x - Ky·E,   E = ∫(y - r) dt clamped to ±e_max
///
/// followed by saturation to the rotor speed bounds.
#[derive(Debug, Clone)]
pub struct LqiController {
    gains: ControlGains,
    hover: Vector4<f64>,
    w_min: f64,
    w_max: f64,
    state: ControllerState,
}

impl LqiController {
    pub fn new(config: &VehicleConfig) -> Self {
        let w_hov = config.airframe.hover_speed();
        let hover = Vector4::repeat(w_hov);
        let gains = config.gains.clone();
        let u0 = initial_output(gains.initial_rotor_speed, w_hov);
        log::debug!(
            "LqiController: hover speed {:.1} rad/s, rotor bounds [{:.1}, {:.1}], e_max {}",
            w_hov,
            config.airframe.w_min,
            config.airframe.w_max,
            gains.e_max
        );
        Self {
            gains,
            hover,
            w_min: config.airframe.w_min,
            w_max: config.airframe.w_max,
            state: ControllerState::new(u0),
        }
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn integral_error(&self) -> Vector4<f64> {
        self.state.integral
    }

    pub fn is_engaged(&self) -> bool {
        self.state.motors_engaged
    }

    /// Disengage the motors and clear the integral error.
    pub fn disengage(&mut self) {
        let w_hov = self.hover[0];
        self.state = ControllerState::new(initial_output(self.gains.initial_rotor_speed, w_hov));
    }

    /// One discrete control step at simulation time `now`.
    pub fn update(
        &mut self,
        now: f64,
        motion: &VehicleMotion,
        reference: &ControlReference,
    ) -> RotorCommand {
        if !reference.active {
            self.disengage();
            return RotorCommand::OFF;
        }

        if !self.state.motors_engaged {
            self.state.motors_engaged = true;
            self.state.clock.rebase(now);
        }

        let dt = match self.state.clock.observe(now) {
            TimeStep::Rewound => {
                log::info!("LqiController: time moved back to {:.3}s, resetting", now);
                self.disengage();
                return RotorCommand::OFF;
            }
            step => step.dt(),
        };

        // Reference velocity from horizon axes to body axes
        let v_cmd_body = motion.horizon_to_body() * reference.velocity;

        let x = state_vector(motion);
        let y = Vector4::new(motion.vel.x, motion.vel.y, motion.vel.z, motion.omega.z);
        let r = Vector4::new(v_cmd_body.x, v_cmd_body.y, v_cmd_body.z, reference.yaw_rate);

        // Integral of the tracking error, anti-windup clamp per component
        let e = y - r;
        let e_max = self.gains.e_max;
        let integral = (self.state.integral + e * dt).map(|v| v.clamp(-e_max, e_max));

        let u = (self.hover - self.gains.kx * x - self.gains.ky * integral)
            .map(|w| w.clamp(self.w_min, self.w_max));

        self.state.x = x;
        self.state.integral = integral;
        self.state.u = u;

        RotorCommand::from_vector(&u)
    }
}

impl super::Controller for LqiController {
    fn control(
        &mut self,
        now: f64,
        motion: &VehicleMotion,
        reference: &ControlReference,
    ) -> RotorCommand {
        self.update(now, motion, reference)
    }

    fn reset(&mut self) {
        self.disengage();
    }

    fn name(&self) -> &str {
        "LqiController"
    }
}

fn initial_output(initial: InitialRotorSpeed, w_hov: f64) -> Vector4<f64> {
    match initial {
        InitialRotorSpeed::Zero => Vector4::zeros(),
        InitialRotorSpeed::Hover => Vector4::repeat(w_hov),
    }
}

/// Assemble `x = [roll, pitch, ω_body, v_body]`.
pub fn state_vector(motion: &VehicleMotion) -> StateVector {
    let (w, v) = (motion.omega, motion.vel);
    StateVector::from_column_slice(&[motion.roll, motion.pitch, w.x, w.y, w.z, v.x, v.y, v.z])
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
