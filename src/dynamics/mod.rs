pub mod state;
pub mod forces;

pub use forces::{forces, AppliedForce, ForceSet};
pub use state::{ControlReference, Rotor, RotorCommand, VehicleMotion, G0};
