pub mod controller;
pub mod lqi;
pub mod plan;
pub mod reference;
pub mod navigator;
pub mod supervisor;

pub use controller::Controller;
pub use lqi::{ControllerState, LqiController};
pub use plan::{FlightPlan, FlightPlanBuilder, Waypoint};
pub use reference::{Command, CommandOrigin, FixedTestCommand, ReferenceSource, RemoteCommandSource};
pub use navigator::WaypointNavigator;
pub use supervisor::{CommandSupervisor, Directive, SupervisorState};
