use crate::config::VehicleConfig;
use crate::dynamics::forces::{forces, ForceSet};
use crate::dynamics::state::RotorCommand;
use crate::gnc::controller::Controller;
use crate::gnc::lqi::LqiController;
use crate::gnc::reference::ReferenceSource;
use crate::gnc::supervisor::{CommandSupervisor, Directive, SupervisorState};
use crate::io::messages::{Inbound, Inbox};
use crate::io::telemetry::{Telemetry, TelemetrySink};
use crate::vehicle::Airframe;
use super::body::RigidBody;
use super::clock::RateLimiter;

/// What happened during one autopilot tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub time: f64,
    pub state: SupervisorState,
    pub rotors: RotorCommand,
    /// Loads handed to the body; `None` on a reset tick
    pub forces: Option<ForceSet>,
    pub telemetry_sent: bool,
    pub messages_received: usize,
}

// ---------------------------------------------------------------------------
// Autopilot: the per-vehicle control pipeline
// ---------------------------------------------------------------------------

/// One vehicle's flight software.
///
/// Each [`tick`](Autopilot::tick) runs, in order: reference source →
/// supervisor → controller → force model → body, then rate-limited telemetry
/// and the rate-limited inbox poll.
pub struct Autopilot {
    name: String,
    airframe: Airframe,
    source: Box<dyn ReferenceSource>,
    supervisor: CommandSupervisor,
    controller: Box<dyn Controller>,
    sink: Option<Box<dyn TelemetrySink>>,
    inbox: Option<Inbox>,
    telemetry_timer: RateLimiter,
    inbox_timer: RateLimiter,
}

impl Autopilot {
    /// Autopilot with the LQI controller, no telemetry and no inbox.
    pub fn new(config: &VehicleConfig, source: Box<dyn ReferenceSource>) -> Self {
        log::info!(
            "Autopilot '{}': {} source, hover speed {:.1} rad/s",
            config.name,
            source.name(),
            config.airframe.hover_speed()
        );
        Self {
            name: config.name.clone(),
            airframe: config.airframe.clone(),
            source,
            supervisor: CommandSupervisor::new(config.timing.remote_limit),
            controller: Box::new(LqiController::new(config)),
            sink: None,
            inbox: None,
            telemetry_timer: RateLimiter::new(config.timing.telemetry_period),
            inbox_timer: RateLimiter::new(config.timing.inbound_period),
        }
    }

    pub fn with_controller(mut self, controller: Box<dyn Controller>) -> Self {
        self.controller = controller;
        self
    }

    pub fn with_sink(mut self, sink: Box<dyn TelemetrySink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn with_inbox(mut self, inbox: Inbox) -> Self {
        self.inbox = Some(inbox);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn supervisor_state(&self) -> SupervisorState {
        self.supervisor.state()
    }

    pub fn tick(&mut self, body: &mut dyn RigidBody) -> TickReport {
        let now = body.sim_time();
        let motion = body.motion();

        // Guidance
        let incoming = self.source.produce_reference(now, &motion);
        let directive = self.supervisor.step(now, incoming);

        // Control
        let rotors = match directive {
            Directive::Drive(reference) => self.controller.control(now, &motion, &reference),
            Directive::MotorsOff => {
                self.controller.reset();
                RotorCommand::OFF
            }
        };

        // Dynamics
        let state = self.supervisor.state();
        let loads = if state == SupervisorState::Reset {
            None
        } else {
            let loads = forces(&self.airframe, &rotors, &motion);
            loads.apply_to(body);
            Some(loads)
        };

        let telemetry_sent = self.publish_telemetry(now, body);
        let messages_received = self.poll_inbox(now);

        TickReport { time: now, state, rotors, forces: loads, telemetry_sent, messages_received }
    }

    fn publish_telemetry(&mut self, now: f64, body: &dyn RigidBody) -> bool {
        let Some(sink) = self.sink.as_mut() else {
            return false;
        };
        if !self.telemetry_timer.ready(now) {
            return false;
        }
        let record = Telemetry::from_motion(&self.name, now, &body.motion());
        match sink.publish(&record) {
            Ok(()) => {
                log::trace!("{}: telemetry at {:.2}s", self.name, now);
                true
            }
            Err(e) => {
                log::warn!("{}: telemetry dropped: {}", self.name, e);
                false
            }
        }
    }

    fn poll_inbox(&mut self, now: f64) -> usize {
        let Some(inbox) = self.inbox.as_ref() else {
            return 0;
        };
        if !self.inbox_timer.ready(now) {
            return 0;
        }
        let messages = inbox.drain();
        let count = messages.len();
        for msg in messages {
            log::debug!("{}: received {} at {:.2}s", self.name, msg.kind(), now);
            match msg {
                Inbound::FlightPlan(plan) => self.source.on_flight_plan(plan, now),
                Inbound::RemoteCommand(cmd) => self.source.on_remote_command(cmd, now),
            }
        }
        count
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
