pub mod clock;
pub mod body;
pub mod integrator;
pub mod autopilot;
pub mod runner;

pub use autopilot::{Autopilot, TickReport};
pub use body::{FreeBody, MassProperties, RigidBody};
pub use clock::{RateLimiter, TimeGuard, TimeStep};
pub use integrator::rk4_step;
pub use runner::{simulate, Sample, SimConfig};
