use crate::dynamics::state::ControlReference;
use crate::gnc::reference::{Command, CommandOrigin};
use crate::sim::clock::TimeGuard;

/// Operating mode of the command supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    /// Motors off, no command held
    Off,
    /// Tracking a live command
    Active,
    /// Last command expired: hold position with motors running
    Hover,
    /// Simulation time went backwards this tick
    Reset,
}

/// What the controller should do this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Directive {
    /// Zero rotors, clear integral state
    MotorsOff,
    /// Track this reference
    Drive(ControlReference),
}

impl Directive {
    pub fn reference(&self) -> Option<&ControlReference> {
        match self {
            Directive::MotorsOff => None,
            Directive::Drive(r) => Some(r),
        }
    }
}

// ---------------------------------------------------------------------------
// Command supervisor
// ---------------------------------------------------------------------------

/// Decides, each tick, whether the motors run and what they track.
///
/// Holds the latest command from the reference source and watches its
/// expiry. An expired command degrades to hover rather than cutting the
/// motors. A backward jump of the simulation clock drops the held command.
#[derive(Debug, Clone)]
pub struct CommandSupervisor {
    held: Option<Command>,
    state: SupervisorState,
    clock: TimeGuard,
    remote_limit: f64,
}

impl CommandSupervisor {
    pub fn new(remote_limit: f64) -> Self {
        Self {
            held: None,
            state: SupervisorState::Off,
            clock: TimeGuard::new(),
            remote_limit,
        }
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    pub fn held(&self) -> Option<&Command> {
        self.held.as_ref()
    }

    pub fn step(&mut self, now: f64, incoming: Option<Command>) -> Directive {
        let rewound = self.clock.observe(now).is_rewound();

        if let Some(cmd) = incoming {
            self.accept(cmd);
        }

        if rewound {
            self.held = None;
            self.transition(SupervisorState::Reset, now);
            return Directive::MotorsOff;
        }

        let Some(cmd) = self.held else {
            self.transition(SupervisorState::Off, now);
            return Directive::MotorsOff;
        };

        if cmd.is_expired(now) {
            self.transition(SupervisorState::Hover, now);
            Directive::Drive(ControlReference::hover())
        } else {
            self.transition(SupervisorState::Active, now);
            Directive::Drive(cmd.reference)
        }
    }

    fn accept(&mut self, cmd: Command) {
        if !cmd.reference.active {
            self.held = None;
            return;
        }
        let cmd = if cmd.origin == CommandOrigin::Remote {
            let clamped = cmd.reference.clamped(self.remote_limit);
            if !cmd.reference.is_finite() {
                log::warn!("CommandSupervisor: non-finite remote command components zeroed");
            } else if clamped != cmd.reference {
                log::warn!(
                    "CommandSupervisor: remote command clamped to ±{}",
                    self.remote_limit
                );
            }
            Command { reference: clamped, ..cmd }
        } else {
            cmd
        };
        self.held = Some(cmd);
    }

    fn transition(&mut self, next: SupervisorState, now: f64) {
        if self.state != next {
            log::info!("CommandSupervisor: {:?} -> {:?} at {:.3}s", self.state, next, now);
            self.state = next;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    fn remote(v: Vector3<f64>, yaw_rate: f64, expires_at: f64) -> Command {
        Command::new(ControlReference::new(v, yaw_rate), expires_at, CommandOrigin::Remote)
    }

    #[test]
    fn starts_off() {
        let mut s = CommandSupervisor::new(4.0);
        assert_eq!(s.step(0.0, None), Directive::MotorsOff);
        assert_eq!(s.state(), SupervisorState::Off);
    }

    #[test]
    fn active_command_is_tracked() {
        let mut s = CommandSupervisor::new(4.0);
        let cmd = remote(Vector3::new(1.0, 0.0, 0.5), 0.2, 5.0);
        let d = s.step(1.0, Some(cmd));
        assert_eq!(d, Directive::Drive(cmd.reference));
        assert_eq!(s.state(), SupervisorState::Active);
        // Held across ticks without a new command
        assert_eq!(s.step(2.0, None), Directive::Drive(cmd.reference));
    }

    #[test]
    fn zero_duration_remote_hovers_next_tick() {
        let mut s = CommandSupervisor::new(4.0);
        // Delivered at t = 3.0 with duration 0
        let cmd = remote(Vector3::new(1.0, 1.0, 0.0), 0.5, 3.0);
        let d = s.step(3.001, Some(cmd));
        assert_eq!(d, Directive::Drive(ControlReference::hover()));
        assert_eq!(s.state(), SupervisorState::Hover);
        let r = d.reference().unwrap();
        assert!(r.active);
        assert_eq!(r.velocity, Vector3::zeros());
        assert_eq!(r.yaw_rate, 0.0);
    }

    #[test]
    fn remote_command_is_clamped() {
        let mut s = CommandSupervisor::new(4.0);
        let d = s.step(0.0, Some(remote(Vector3::new(10.0, -7.0, 2.0), 9.0, 1.0)));
        let r = d.reference().unwrap();
        assert_eq!(r.velocity, Vector3::new(4.0, -4.0, 2.0));
        assert_eq!(r.yaw_rate, 4.0);
    }

    #[test]
    fn non_finite_remote_components_are_zeroed() {
        let mut s = CommandSupervisor::new(4.0);
        let d = s.step(0.0, Some(remote(Vector3::new(f64::NAN, 2.0, f64::INFINITY), f64::NAN, 1.0)));
        let r = d.reference().unwrap();
        assert_eq!(r.velocity, Vector3::new(0.0, 2.0, 0.0));
        assert_eq!(r.yaw_rate, 0.0);
        assert_eq!(s.state(), SupervisorState::Active);
    }

    #[test]
    fn navigator_command_is_not_clamped() {
        let mut s = CommandSupervisor::new(4.0);
        let cmd = Command::new(
            ControlReference::new(Vector3::new(6.0, 0.0, 0.0), 0.0),
            1.0,
            CommandOrigin::FlightPlan,
        );
        let d = s.step(0.0, Some(cmd));
        assert_eq!(d.reference().unwrap().velocity.x, 6.0);
    }

    #[test]
    fn inactive_command_turns_off() {
        let mut s = CommandSupervisor::new(4.0);
        s.step(0.0, Some(remote(Vector3::new(1.0, 0.0, 0.0), 0.0, 10.0)));
        let d = s.step(0.1, Some(Command::off(CommandOrigin::FlightPlan)));
        assert_eq!(d, Directive::MotorsOff);
        assert_eq!(s.state(), SupervisorState::Off);
        assert!(s.held().is_none());
    }

    #[test]
    fn rewind_resets_then_stays_off() {
        let mut s = CommandSupervisor::new(4.0);
        s.step(5.0, Some(remote(Vector3::new(1.0, 0.0, 0.0), 0.0, 100.0)));
        assert_eq!(s.step(1.0, None), Directive::MotorsOff);
        assert_eq!(s.state(), SupervisorState::Reset);
        assert_eq!(s.step(1.1, None), Directive::MotorsOff);
        assert_eq!(s.state(), SupervisorState::Off);
        // A fresh command re-activates from the new time base
        let cmd = remote(Vector3::new(0.5, 0.0, 0.0), 0.0, 2.0);
        assert_eq!(s.step(1.2, Some(cmd)), Directive::Drive(cmd.reference));
    }

    #[test]
    fn hover_resumes_on_new_command() {
        let mut s = CommandSupervisor::new(4.0);
        s.step(0.0, Some(remote(Vector3::new(1.0, 0.0, 0.0), 0.0, 0.5)));
        s.step(1.0, None);
        assert_eq!(s.state(), SupervisorState::Hover);
        s.step(1.1, Some(remote(Vector3::new(0.0, 1.0, 0.0), 0.0, 3.0)));
        assert_eq!(s.state(), SupervisorState::Active);
    }
}
