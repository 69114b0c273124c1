use std::sync::Arc;

use nalgebra::Vector3;

use crate::dynamics::state::{ControlReference, VehicleMotion};
use crate::gnc::plan::FlightPlan;
use crate::io::messages::RemoteCommand;

// ---------------------------------------------------------------------------
// Commands handed from a reference source to the supervisor
// ---------------------------------------------------------------------------

/// Where a command came from. Remote commands are bounded before use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOrigin {
    Fixed,
    Remote,
    FlightPlan,
}

/// A reference plus the simulation time after which it is stale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Command {
    pub reference: ControlReference,
    pub expires_at: f64, // s, absolute simulation time
    pub origin: CommandOrigin,
}

impl Command {
    pub fn new(reference: ControlReference, expires_at: f64, origin: CommandOrigin) -> Self {
        Self { reference, expires_at, origin }
    }

    /// Explicit motors-off command. Never expires.
    pub fn off(origin: CommandOrigin) -> Self {
        Self::new(ControlReference::off(), f64::INFINITY, origin)
    }

    pub fn is_expired(&self, now: f64) -> bool {
        now > self.expires_at
    }
}

/// Anything that can tell the supervisor what the vehicle should do.
///
/// Called once per tick. `None` means "nothing new", the supervisor keeps
/// whatever it already holds.
pub trait ReferenceSource {
    fn produce_reference(&mut self, now: f64, motion: &VehicleMotion) -> Option<Command>;

    /// A new flight plan arrived from the messaging layer.
    fn on_flight_plan(&mut self, plan: Arc<FlightPlan>, _now: f64) {
        log::debug!("{}: ignoring flight plan {}", self.name(), plan.plan_id());
    }

    /// A remote velocity command arrived from the messaging layer.
    fn on_remote_command(&mut self, _cmd: RemoteCommand, _now: f64) {
        log::debug!("{}: ignoring remote command", self.name());
    }

    fn name(&self) -> &str {
        "unnamed"
    }
}

// ---------------------------------------------------------------------------
// Fixed test command
// ---------------------------------------------------------------------------

/// Constant command used for bench tests of the inner loop.
#[derive(Debug, Clone)]
pub struct FixedTestCommand {
    reference: ControlReference,
}

impl FixedTestCommand {
    pub fn new(velocity: Vector3<f64>, yaw_rate: f64) -> Self {
        Self { reference: ControlReference::new(velocity, yaw_rate) }
    }

    /// 2 m/s forward while turning at 1 rad/s.
    pub fn forward_turn() -> Self {
        Self::new(Vector3::new(2.0, 0.0, 0.0), 1.0)
    }
}

impl ReferenceSource for FixedTestCommand {
    fn produce_reference(&mut self, _now: f64, _motion: &VehicleMotion) -> Option<Command> {
        Some(Command::new(self.reference, f64::INFINITY, CommandOrigin::Fixed))
    }

    fn name(&self) -> &str {
        "FixedTestCommand"
    }
}

// ---------------------------------------------------------------------------
// Remote commands
// ---------------------------------------------------------------------------

/// Forwards velocity commands received over the inbox.
///
/// Each remote command is valid for its `duration` from the moment it is
/// delivered. It is handed to the supervisor once; expiry is the supervisor's
/// business.
#[derive(Debug, Clone, Default)]
pub struct RemoteCommandSource {
    pending: Option<Command>,
}

impl RemoteCommandSource {
    pub fn new() -> Self {
        Self { pending: None }
    }
}

impl ReferenceSource for RemoteCommandSource {
    fn produce_reference(&mut self, _now: f64, _motion: &VehicleMotion) -> Option<Command> {
        self.pending.take()
    }

    fn on_remote_command(&mut self, cmd: RemoteCommand, now: f64) {
        let command = if cmd.on {
            let duration = if cmd.duration.is_nan() {
                log::warn!("RemoteCommandSource: NaN duration, command expires on delivery");
                0.0
            } else {
                cmd.duration
            };
            let reference = ControlReference::new(cmd.velocity, cmd.yaw_rate);
            Command::new(reference, now + duration, CommandOrigin::Remote)
        } else {
            Command::off(CommandOrigin::Remote)
        };
        log::debug!(
            "RemoteCommandSource: on={} v=({:.2}, {:.2}, {:.2}) yaw_rate={:.2} until {:.2}s",
            cmd.on,
            cmd.velocity.x,
            cmd.velocity.y,
            cmd.velocity.z,
            cmd.yaw_rate,
            command.expires_at
        );
        self.pending = Some(command);
    }

    fn name(&self) -> &str {
        "RemoteCommandSource"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn still() -> VehicleMotion {
        VehicleMotion::at_rest(Vector3::zeros())
    }

    #[test]
    fn fixed_command_never_expires() {
        let mut src = FixedTestCommand::forward_turn();
        let cmd = src.produce_reference(1e6, &still()).unwrap();
        assert!(!cmd.is_expired(1e9));
        assert_eq!(cmd.reference.velocity, Vector3::new(2.0, 0.0, 0.0));
        assert_eq!(cmd.reference.yaw_rate, 1.0);
    }

    #[test]
    fn remote_command_expires_after_duration() {
        let mut src = RemoteCommandSource::new();
        src.on_remote_command(RemoteCommand::velocity(Vector3::new(1.0, 0.0, 0.0), 0.0, 3.0), 10.0);
        let cmd = src.produce_reference(10.0, &still()).unwrap();
        assert_eq!(cmd.origin, CommandOrigin::Remote);
        assert_eq!(cmd.expires_at, 13.0);
        assert!(!cmd.is_expired(13.0));
        assert!(cmd.is_expired(13.01));
    }

    #[test]
    fn remote_command_is_handed_over_once() {
        let mut src = RemoteCommandSource::new();
        src.on_remote_command(RemoteCommand::stop(), 0.0);
        let cmd = src.produce_reference(0.1, &still()).unwrap();
        assert!(!cmd.reference.active);
        assert!(src.produce_reference(0.2, &still()).is_none());
    }
}
