pub mod messages;
pub mod telemetry;
pub mod csv;
pub mod json;

pub use messages::{inbox, Inbound, Inbox, InboxSender, RemoteCommand, Stamp};
pub use telemetry::{ChannelSink, JsonLinesSink, Telemetry, TelemetrySink};
