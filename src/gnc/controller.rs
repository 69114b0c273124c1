use crate::dynamics::state::{ControlReference, RotorCommand, VehicleMotion};

/// Trait for inner-loop flight controllers.
///
/// Implement this to plug a different control law into the autopilot
/// pipeline. The supervisor decides when the motors run; the controller only
/// turns a reference into rotor speeds.
pub trait Controller {
    /// Compute rotor speeds for simulation time `now`.
    fn control(
        &mut self,
        now: f64,
        motion: &VehicleMotion,
        reference: &ControlReference,
    ) -> RotorCommand;

    /// Motors commanded off: drop integral state and disengage.
    fn reset(&mut self) {}

    /// Human-readable name for logging/display.
    fn name(&self) -> &str {
        "unnamed"
    }
}
