//! Flight-control core for a simulated quadrotor.
//!
//! A reference source (waypoint navigator, remote operator or a fixed test
//! command) feeds the command supervisor, which gates an LQI velocity
//! controller. Rotor speeds go through the force model to whatever physics
//! engine implements [`sim::RigidBody`].

pub mod config;
pub mod error;
pub mod physics;
pub mod dynamics;
pub mod vehicle;
pub mod gnc;
pub mod sim;
pub mod io;

pub use config::{Timing, VehicleConfig};
pub use error::{Error, PlanError, Result};
