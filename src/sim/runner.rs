use crate::dynamics::state::{RotorCommand, VehicleMotion};
use crate::gnc::supervisor::SupervisorState;
use super::autopilot::Autopilot;
use super::body::{FreeBody, RigidBody};

#[derive(Debug, Clone)]
pub struct SimConfig {
    pub dt: f64,
    pub max_time: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self { dt: 0.002, max_time: 30.0 }
    }
}

/// One row of a closed-loop run.
#[derive(Debug, Clone, Copy)]
pub struct Sample {
    pub time: f64,
    pub motion: VehicleMotion,
    pub state: SupervisorState,
    pub rotors: RotorCommand,
}

// ---------------------------------------------------------------------------
// Closed-loop simulation
// ---------------------------------------------------------------------------

/// Fly `autopilot` on `body` until `config.max_time`.
///
/// Each step ticks the autopilot once, then integrates the body over `dt`
/// with the loads from that tick.
pub fn simulate(autopilot: &mut Autopilot, body: &mut FreeBody, config: &SimConfig) -> Vec<Sample> {
    let capacity = ((config.max_time - body.sim_time()) / config.dt).max(0.0) as usize + 1;
    let mut samples = Vec::with_capacity(capacity.min(200_000));

    while body.sim_time() < config.max_time {
        let report = autopilot.tick(body);
        samples.push(Sample {
            time: report.time,
            motion: body.motion(),
            state: report.state,
            rotors: report.rotors,
        });
        body.step(config.dt);
    }

    samples
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
