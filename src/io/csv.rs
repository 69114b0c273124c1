use std::io::{self, Write};
use std::path::Path;

use crate::error::Result;
use crate::io::telemetry::{Telemetry, TelemetrySink};

const HEADER: &str = "time,uav_id,pos_x,pos_y,pos_z,roll_deg,pitch_deg,yaw_deg,\
                      vel_x,vel_y,vel_z,omega_x,omega_y,omega_z";

fn write_row<W: Write>(writer: &mut W, t: &Telemetry) -> io::Result<()> {
    writeln!(
        writer,
        "{:.3},{},{:.4},{:.4},{:.4},{:.2},{:.2},{:.2},\
         {:.4},{:.4},{:.4},{:.4},{:.4},{:.4}",
        t.secs(),
        t.uav_id,
        t.pos.x, t.pos.y, t.pos.z,
        t.roll.to_degrees(),
        t.pitch.to_degrees(),
        t.yaw.to_degrees(),
        t.vel.x, t.vel.y, t.vel.z,
        t.omega.x, t.omega.y, t.omega.z,
    )
}

/// Write a telemetry log to CSV.
///
/// Columns: time, uav_id, pos_x, pos_y, pos_z, roll_deg, pitch_deg, yaw_deg,
///          vel_x, vel_y, vel_z, omega_x, omega_y, omega_z
pub fn write_telemetry<W: Write>(writer: &mut W, records: &[Telemetry]) -> io::Result<()> {
    writeln!(writer, "{HEADER}")?;
    for t in records {
        write_row(writer, t)?;
    }
    Ok(())
}

pub fn write_telemetry_file<P: AsRef<Path>>(path: P, records: &[Telemetry]) -> io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    write_telemetry(&mut file, records)
}

/// Streams telemetry to CSV as it is published. The header goes out with the
/// first record.
pub struct CsvSink<W: Write> {
    writer: W,
    header_written: bool,
}

impl<W: Write> CsvSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, header_written: false }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> TelemetrySink for CsvSink<W> {
    fn publish(&mut self, record: &Telemetry) -> Result<()> {
        if !self.header_written {
            writeln!(self.writer, "{HEADER}")?;
            self.header_written = true;
        }
        write_row(&mut self.writer, record)?;
        Ok(())
    }
}
