use std::io::Write;
use std::path::Path;

use nalgebra::Vector3;
use serde::Serialize;

use crate::error::Result;
use crate::io::telemetry::Telemetry;

/// Summary statistics computed from a telemetry log.
#[derive(Debug, Clone, Serialize)]
pub struct FlightSummary {
    pub uav_id: String,
    pub samples: usize,
    pub flight_time: f64,      // s, first to last record
    pub distance_m: f64,       // path length between records
    pub max_speed: f64,        // m/s
    pub max_altitude: f64,     // m
    pub final_pos: Vector3<f64>,
}

impl FlightSummary {
    /// `None` for an empty log.
    pub fn from_telemetry(records: &[Telemetry]) -> Option<Self> {
        let first = records.first()?;
        let last = records.last()?;

        let distance_m = records
            .windows(2)
            .map(|w| (w[1].pos - w[0].pos).norm())
            .sum();

        let max_speed = records
            .iter()
            .map(|t| t.vel.norm())
            .fold(0.0_f64, f64::max);

        let max_altitude = records
            .iter()
            .map(|t| t.pos.z)
            .fold(f64::NEG_INFINITY, f64::max);

        Some(FlightSummary {
            uav_id: first.uav_id.clone(),
            samples: records.len(),
            flight_time: last.secs() - first.secs(),
            distance_m,
            max_speed,
            max_altitude,
            final_pos: last.pos,
        })
    }
}

#[derive(Serialize)]
struct SummaryDoc<'a> {
    vehicle: &'a str,
    performance: &'a FlightSummary,
}

/// Write flight summary as pretty JSON.
pub fn write_summary<W: Write>(writer: &mut W, vehicle: &str, summary: &FlightSummary) -> Result<()> {
    let doc = SummaryDoc { vehicle, performance: summary };
    serde_json::to_writer_pretty(&mut *writer, &doc)?;
    writeln!(writer)?;
    Ok(())
}

pub fn write_summary_file<P: AsRef<Path>>(
    path: P,
    vehicle: &str,
    summary: &FlightSummary,
) -> Result<()> {
    let mut file = std::fs::File::create(path)?;
    write_summary(&mut file, vehicle, summary)
}
