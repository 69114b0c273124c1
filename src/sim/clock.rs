//! Simulation-time bookkeeping.
//!
//! The simulator clock can jump backwards when a world is reset. Every
//! consumer of time in this crate goes through [`TimeGuard`] (or the same
//! rebase rule in [`RateLimiter`]) so that a rewind is always handled the
//! same way: drop the old timestamp, take the new one, and treat the tick as
//! a restart instead of a negative interval.

/// Outcome of observing a new timestamp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeStep {
    /// No previous timestamp
    First,
    /// Time moved forward (or stood still) by `dt` seconds
    Forward(f64),
    /// Time went backwards: the simulation was reset
    Rewound,
}

impl TimeStep {
    pub fn is_rewound(&self) -> bool {
        matches!(self, TimeStep::Rewound)
    }

    /// Elapsed seconds; zero for a first or rewound observation.
    pub fn dt(&self) -> f64 {
        match *self {
            TimeStep::Forward(dt) => dt,
            TimeStep::First | TimeStep::Rewound => 0.0,
        }
    }
}

/// Monotonicity guard around the last seen simulation time.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TimeGuard {
    last: Option<f64>,
}

impl TimeGuard {
    pub fn new() -> Self {
        Self { last: None }
    }

    /// Record `now` and classify it against the previous timestamp.
    /// A rewind rebases to `now`.
    pub fn observe(&mut self, now: f64) -> TimeStep {
        let step = match self.last {
            None => TimeStep::First,
            Some(prev) if now < prev => TimeStep::Rewound,
            Some(prev) => TimeStep::Forward(now - prev),
        };
        self.last = Some(now);
        step
    }

    /// Forget the previous timestamp and start counting from `now`.
    pub fn rebase(&mut self, now: f64) {
        self.last = Some(now);
    }

    pub fn last(&self) -> Option<f64> {
        self.last
    }
}

// ---------------------------------------------------------------------------
// Rate limiting for periodic I/O
// ---------------------------------------------------------------------------

/// True when at least `period` has elapsed since `last_fired`.
pub fn period_elapsed(now: f64, last_fired: f64, period: f64) -> bool {
    now - last_fired >= period
}

/// Fires at most once per `period` of simulation time.
///
/// The first call arms the limiter without firing. A backward time jump
/// rebases instead of firing a burst.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimiter {
    period: f64,
    last_fired: Option<f64>,
}

impl RateLimiter {
    pub fn new(period: f64) -> Self {
        Self { period, last_fired: None }
    }

    pub fn period(&self) -> f64 {
        self.period
    }

    /// Arm the limiter at `now`; the first firing is one period later.
    pub fn arm(&mut self, now: f64) {
        self.last_fired = Some(now);
    }

    pub fn ready(&mut self, now: f64) -> bool {
        let last = match self.last_fired {
            None => {
                self.last_fired = Some(now);
                return false;
            }
            Some(last) if now < last => {
                self.last_fired = Some(now);
                return false;
            }
            Some(last) => last,
        };
        if period_elapsed(now, last, self.period) {
            self.last_fired = Some(now);
            true
        } else {
            false
        }
    }
}
