use nalgebra::UnitQuaternion;

use super::body::{derivatives, BodyState, MassProperties, Wrench};

// ---------------------------------------------------------------------------
// 6DOF RK4 integrator with constant wrench over the step
// ---------------------------------------------------------------------------

/// Single RK4 step. The wrench comes from one autopilot tick and is held
/// constant over `dt`.
pub fn rk4_step(state: &BodyState, props: &MassProperties, wrench: &Wrench, dt: f64) -> BodyState {
    let k1 = derivatives(state, props, wrench);
    let k2 = derivatives(&state.apply(&k1, dt * 0.5), props, wrench);
    let k3 = derivatives(&state.apply(&k2, dt * 0.5), props, wrench);
    let k4 = derivatives(&state.apply(&k3, dt), props, wrench);

    let new_quat_raw = state.quat.quaternion()
        + (k1.dquat + k2.dquat * 2.0 + k3.dquat * 2.0 + k4.dquat) * (dt / 6.0);

    BodyState {
        time: state.time + dt,
        pos: state.pos + (k1.dpos + 2.0 * k2.dpos + 2.0 * k3.dpos + k4.dpos) * (dt / 6.0),
        vel: state.vel + (k1.dvel + 2.0 * k2.dvel + 2.0 * k3.dvel + k4.dvel) * (dt / 6.0),
        quat: UnitQuaternion::new_normalize(new_quat_raw),
        omega: state.omega
            + (k1.domega + 2.0 * k2.domega + 2.0 * k3.domega + k4.domega) * (dt / 6.0),
    }
}
