use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::error::PlanError;

// ---------------------------------------------------------------------------
// Flight plan: a timed route of waypoints
// ---------------------------------------------------------------------------

/// Target position the vehicle must reach at an absolute simulation time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub pos: Vector3<f64>, // m, world
    pub time: f64,         // s, absolute simulation time
}

impl Waypoint {
    pub fn new(x: f64, y: f64, z: f64, time: f64) -> Self {
        Self { pos: Vector3::new(x, y, z), time }
    }
}

/// Immutable route. Timestamps are strictly increasing; a plan is never
/// edited, only replaced by a newer one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPlan")]
pub struct FlightPlan {
    plan_id: u32,
    route: Vec<Waypoint>,
}

#[derive(Deserialize)]
struct RawPlan {
    plan_id: u32,
    route: Vec<Waypoint>,
}

impl TryFrom<RawPlan> for FlightPlan {
    type Error = PlanError;

    fn try_from(raw: RawPlan) -> Result<Self, PlanError> {
        FlightPlan::new(raw.plan_id, raw.route)
    }
}

impl FlightPlan {
    pub fn new(plan_id: u32, route: Vec<Waypoint>) -> Result<Self, PlanError> {
        if route.is_empty() {
            return Err(PlanError::EmptyRoute);
        }
        for (index, wp) in route.iter().enumerate() {
            if !(wp.time.is_finite() && wp.pos.iter().all(|c| c.is_finite())) {
                return Err(PlanError::NonFinite { index });
            }
            if index > 0 && wp.time <= route[index - 1].time {
                return Err(PlanError::NonMonotonic { index });
            }
        }
        Ok(Self { plan_id, route })
    }

    pub fn plan_id(&self) -> u32 {
        self.plan_id
    }

    pub fn route(&self) -> &[Waypoint] {
        &self.route
    }

    pub fn len(&self) -> usize {
        self.route.len()
    }

    pub fn is_empty(&self) -> bool {
        self.route.is_empty()
    }

    pub fn start_time(&self) -> f64 {
        self.route[0].time
    }

    pub fn end_time(&self) -> f64 {
        self.route[self.route.len() - 1].time
    }

    /// Index of the first waypoint not yet reached at `now`, or `len()` once
    /// every waypoint time has passed.
    pub fn planned_index(&self, now: f64) -> usize {
        self.route
            .iter()
            .position(|wp| now < wp.time)
            .unwrap_or(self.route.len())
    }

    /// Where the vehicle should be at time `t` while heading for waypoint
    /// `index`: linear interpolation along the leg `index-1 → index`.
    ///
    /// `t` slightly past the leg end extrapolates along the same line. For
    /// `index == 0` or past the end the target is that end of the route.
    pub fn planned_position(&self, index: usize, t: f64) -> Vector3<f64> {
        if index == 0 {
            return self.route[0].pos;
        }
        if index >= self.route.len() {
            return self.route[self.route.len() - 1].pos;
        }
        let a = &self.route[index - 1];
        let b = &self.route[index];
        let frac = (t - a.time) / (b.time - a.time);
        a.pos + (b.pos - a.pos) * frac
    }

    /// Total straight-line length of the route, m.
    pub fn length(&self) -> f64 {
        self.route
            .windows(2)
            .map(|w| (w[1].pos - w[0].pos).norm())
            .sum()
    }
}

// ---------------------------------------------------------------------------
// Flight plan builder
// ---------------------------------------------------------------------------

pub struct FlightPlanBuilder {
    plan_id: u32,
    route: Vec<Waypoint>,
}

impl FlightPlanBuilder {
    pub fn new(plan_id: u32) -> Self {
        Self { plan_id, route: vec![] }
    }

    pub fn waypoint(mut self, x: f64, y: f64, z: f64, time: f64) -> Self {
        self.route.push(Waypoint::new(x, y, z, time));
        self
    }

    pub fn build(self) -> Result<FlightPlan, PlanError> {
        FlightPlan::new(self.plan_id, self.route)
    }
}
