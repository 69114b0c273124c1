use std::sync::Arc;

use crate::config::Timing;
use crate::dynamics::state::{ControlReference, VehicleMotion};
use crate::gnc::plan::FlightPlan;
use crate::gnc::reference::{Command, CommandOrigin, ReferenceSource};

/// Cursor value while no plan is held.
pub const NO_WAYPOINT: isize = -1;

// ---------------------------------------------------------------------------
// Waypoint navigator
// ---------------------------------------------------------------------------

/// Turns a timed route into short-lived velocity commands.
///
/// Each tick the navigator works out which leg of the route the vehicle
/// should be on, samples the interpolated position slightly ahead of `now`,
/// and commands the velocity that closes the gap in one second.
///
/// A plan must be picked up before its first waypoint time. One whose first
/// waypoint has already passed when the navigator first looks at it is
/// dropped as stale.
#[derive(Debug, Clone)]
pub struct WaypointNavigator {
    plan: Option<Arc<FlightPlan>>,
    cursor: Option<usize>,
    lookahead: f64,        // s
    command_duration: f64, // s
}

impl WaypointNavigator {
    pub fn new(timing: &Timing) -> Self {
        Self {
            plan: None,
            cursor: None,
            lookahead: timing.lookahead,
            command_duration: timing.command_duration,
        }
    }

    /// Replace the held plan wholesale and restart from the beginning.
    pub fn load_plan(&mut self, plan: Arc<FlightPlan>) {
        log::info!(
            "WaypointNavigator: flight plan {} received, {} waypoints, {:.1}s to {:.1}s",
            plan.plan_id(),
            plan.len(),
            plan.start_time(),
            plan.end_time()
        );
        for (i, wp) in plan.route().iter().enumerate() {
            log::debug!(
                "  wp {:>2}: ({:>7.2}, {:>7.2}, {:>7.2}) @ {:.2}s",
                i,
                wp.pos.x,
                wp.pos.y,
                wp.pos.z,
                wp.time
            );
        }
        self.plan = Some(plan);
        self.cursor = None;
    }

    pub fn plan(&self) -> Option<&FlightPlan> {
        self.plan.as_deref()
    }

    /// `-1` without a plan, `0` waiting at the start, `1..N-1` en route,
    /// `N` once the route has run out.
    pub fn current_waypoint_index(&self) -> isize {
        self.cursor.map_or(NO_WAYPOINT, |i| i as isize)
    }

    fn drop_plan(&mut self) {
        self.plan = None;
        self.cursor = None;
    }

    pub fn navigate(&mut self, now: f64, motion: &VehicleMotion) -> Option<Command> {
        let plan = Arc::clone(self.plan.as_ref()?);
        let index = plan.planned_index(now);

        if self.cursor.is_none() && index != 0 {
            log::warn!(
                "WaypointNavigator: plan {} is stale at {:.2}s (first waypoint at {:.2}s), discarded",
                plan.plan_id(),
                now,
                plan.start_time()
            );
            self.drop_plan();
            return None;
        }

        if self.cursor != Some(index) {
            self.cursor = Some(index);
            if index == 0 {
                log::info!("WaypointNavigator: waiting for start at {:.2}s", plan.start_time());
            } else if index == 1 {
                log::info!("WaypointNavigator: starting plan {}", plan.plan_id());
            } else if index < plan.len() {
                log::info!("WaypointNavigator: heading for waypoint {}", index);
            }
        }

        if index == 0 {
            return None;
        }

        if index >= plan.len() {
            log::info!("WaypointNavigator: plan {} finished, motors off", plan.plan_id());
            self.drop_plan();
            return Some(Command::off(CommandOrigin::FlightPlan));
        }

        let target = plan.planned_position(index, now + self.lookahead);
        let reference = ControlReference::new(target - motion.pos, 0.0);
        Some(Command::new(reference, now + self.command_duration, CommandOrigin::FlightPlan))
    }
}

impl ReferenceSource for WaypointNavigator {
    fn produce_reference(&mut self, now: f64, motion: &VehicleMotion) -> Option<Command> {
        self.navigate(now, motion)
    }

    fn on_flight_plan(&mut self, plan: Arc<FlightPlan>, _now: f64) {
        self.load_plan(plan);
    }

    fn name(&self) -> &str {
        "WaypointNavigator"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
