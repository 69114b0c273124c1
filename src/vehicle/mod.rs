pub mod airframe;
pub mod gains;

pub use airframe::{Airframe, AirframeBuilder, RotorOffsets};
pub use gains::{ControlGains, InitialRotorSpeed};
