//! Error types for the autopilot crate.
//!
//! Errors only surface at the edges: loading configuration, building flight
//! plans, and talking to the messaging layer. A control tick never fails.

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Crate-level error
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration could not be written
    #[error("Config encode error: {0}")]
    ConfigEncode(#[from] toml::ser::Error),

    /// Configuration parsed but holds unusable values
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Flight plan rejected at construction
    #[error("Invalid flight plan: {0}")]
    InvalidPlan(#[from] PlanError),

    /// Telemetry record could not be encoded
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Inbound queue is full, message dropped
    #[error("Inbox full, dropped {0}")]
    InboxFull(&'static str),

    /// The other end of a channel has gone away
    #[error("Channel disconnected: {0}")]
    Disconnected(&'static str),
}

/// Reasons a route cannot become a flight plan
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlanError {
    /// No waypoints at all
    #[error("route has no waypoints")]
    EmptyRoute,

    /// Waypoint timestamp not strictly after its predecessor
    #[error("waypoint {index} is not later than its predecessor")]
    NonMonotonic {
        /// Index of the offending waypoint
        index: usize,
    },

    /// NaN or infinite position/time
    #[error("waypoint {index} has a non-finite value")]
    NonFinite {
        /// Index of the offending waypoint
        index: usize,
    },
}
