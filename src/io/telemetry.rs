use std::io::Write;

use crossbeam_channel::{Receiver, Sender};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::dynamics::state::VehicleMotion;
use crate::error::{Error, Result};
use crate::io::messages::Stamp;

/// Periodic state report published by each vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Telemetry {
    pub uav_id: String,
    pub pos: Vector3<f64>,   // m, world
    pub roll: f64,           // rad
    pub pitch: f64,          // rad
    pub yaw: f64,            // rad
    pub vel: Vector3<f64>,   // m/s, body
    pub omega: Vector3<f64>, // rad/s, body
    pub time: Stamp,
}

impl Telemetry {
    pub fn from_motion(uav_id: &str, now: f64, motion: &VehicleMotion) -> Self {
        Self {
            uav_id: uav_id.to_string(),
            pos: motion.pos,
            roll: motion.roll,
            pitch: motion.pitch,
            yaw: motion.yaw,
            vel: motion.vel,
            omega: motion.omega,
            time: Stamp::from_secs(now),
        }
    }

    pub fn secs(&self) -> f64 {
        self.time.as_secs()
    }
}

/// Destination for telemetry records.
pub trait TelemetrySink {
    fn publish(&mut self, record: &Telemetry) -> Result<()>;
}

/// Keeps every record in memory.
impl TelemetrySink for Vec<Telemetry> {
    fn publish(&mut self, record: &Telemetry) -> Result<()> {
        self.push(record.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Channel sink
// ---------------------------------------------------------------------------

/// Hands records to another thread over an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: Sender<Telemetry>,
}

impl ChannelSink {
    pub fn new() -> (Self, Receiver<Telemetry>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Self { tx }, rx)
    }
}

impl TelemetrySink for ChannelSink {
    fn publish(&mut self, record: &Telemetry) -> Result<()> {
        self.tx
            .send(record.clone())
            .map_err(|_| Error::Disconnected("telemetry"))
    }
}

// ---------------------------------------------------------------------------
// JSON lines sink
// ---------------------------------------------------------------------------

/// One JSON object per line.
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> TelemetrySink for JsonLinesSink<W> {
    fn publish(&mut self, record: &Telemetry) -> Result<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(t: f64) -> Telemetry {
        let mut m = VehicleMotion::at_rest(Vector3::new(1.0, 2.0, 3.0));
        m.yaw = 0.5;
        Telemetry::from_motion("uav01", t, &m)
    }

    #[test]
    fn json_lines_are_parseable() {
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.publish(&record(1.0)).unwrap();
        sink.publish(&record(2.5)).unwrap();
        let text = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let back: Telemetry = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(back.uav_id, "uav01");
        assert_eq!(back.time, Stamp { sec: 2, nanosec: 500_000_000 });
        assert_eq!(back.pos, Vector3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn channel_sink_forwards() {
        let (mut sink, rx) = ChannelSink::new();
        sink.publish(&record(3.0)).unwrap();
        assert_eq!(rx.try_recv().unwrap().secs(), 3.0);
        drop(rx);
        assert!(matches!(sink.publish(&record(4.0)), Err(Error::Disconnected(_))));
    }
}
