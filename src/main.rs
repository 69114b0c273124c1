use std::path::PathBuf;

use clap::Parser;
use nalgebra::Vector3;
use quad_autopilot::config::VehicleConfig;
use quad_autopilot::error::Result;
use quad_autopilot::gnc::{FlightPlan, FlightPlanBuilder, WaypointNavigator};
use quad_autopilot::io::csv::write_telemetry_file;
use quad_autopilot::io::json::{write_summary_file, FlightSummary};
use quad_autopilot::io::{inbox, ChannelSink, Telemetry};
use quad_autopilot::sim::{simulate, Autopilot, FreeBody, MassProperties, SimConfig};
use quad_autopilot::vehicle::InitialRotorSpeed;

/// Fly a square circuit closed-loop and print the flight report
#[derive(Parser, Debug)]
#[command(name = "quad-autopilot")]
#[command(version)]
struct Args {
    /// Vehicle config (TOML); the minidrone preset when omitted
    config: Option<PathBuf>,

    /// Write the telemetry trace as CSV
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Write the flight summary as JSON
    #[arg(long)]
    summary: Option<PathBuf>,
}

/// Square circuit at 1.5 m, then a slow descent. The plan reaches the
/// vehicle on the first inbox poll (t = 2 s), so it starts at t = 4 s.
fn square_circuit() -> std::result::Result<FlightPlan, quad_autopilot::PlanError> {
    FlightPlanBuilder::new(1)
        .waypoint(0.0, 0.0, 1.5, 4.0)
        .waypoint(4.0, 0.0, 1.5, 8.0)
        .waypoint(4.0, 4.0, 1.5, 12.0)
        .waypoint(0.0, 4.0, 1.5, 16.0)
        .waypoint(0.0, 0.0, 1.5, 20.0)
        .waypoint(0.0, 0.0, 0.3, 24.0)
        .build()
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => VehicleConfig::from_file(path)?,
        None => VehicleConfig::minidrone(),
    };
    config.validate()?;

    // -----------------------------------------------------------------------
    // Vehicle, messaging and physics
    // -----------------------------------------------------------------------
    let (tx, rx) = inbox(8);
    let (sink, telemetry_rx) = ChannelSink::new();
    let navigator = WaypointNavigator::new(&config.timing);
    let mut autopilot = Autopilot::new(&config, Box::new(navigator))
        .with_sink(Box::new(sink))
        .with_inbox(rx);
    let mut body = FreeBody::new(MassProperties::minidrone(&config.airframe), Vector3::zeros());

    let plan = square_circuit()?;
    let plan_len = plan.length();
    tx.send_plan(plan)?;

    let sim = SimConfig { dt: 0.002, max_time: 28.0 };

    // -----------------------------------------------------------------------
    // Run simulation
    // -----------------------------------------------------------------------
    let samples = simulate(&mut autopilot, &mut body, &sim);
    let telemetry: Vec<Telemetry> = telemetry_rx.try_iter().collect();

    // -----------------------------------------------------------------------
    // Print results
    // -----------------------------------------------------------------------
    let a = &config.airframe;
    println!();
    println!("====================================================================");
    println!("  QUADROTOR FLIGHT SIMULATION: {}", config.name);
    println!("====================================================================");
    println!();
    println!("  Vehicle Parameters");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  Mass:          {:>8.3} kg    TWR:          {:>8.2}",
        a.mass,
        a.twr()
    );
    println!(
        "  Hover speed:   {:>8.1} rad/s Max speed:    {:>8.1} rad/s",
        a.hover_speed(),
        a.w_max
    );
    println!(
        "  E max:         {:>8.1}       Rotor start:  {:>8}",
        config.gains.e_max,
        match config.gains.initial_rotor_speed {
            InitialRotorSpeed::Zero => "zero",
            InitialRotorSpeed::Hover => "hover",
        }
    );
    println!("  Route length:  {:>8.1} m", plan_len);
    println!();

    println!("  Trajectory");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  {:>7}  {:>7}  {:>7}  {:>7}  {:>8}  {:>7}",
        "t (s)", "x (m)", "y (m)", "z (m)", "v (m/s)", "mode"
    );
    println!("  {}", "─".repeat(56));

    let sample_interval = (samples.len() / 28).max(1);
    for (i, s) in samples.iter().enumerate() {
        if i % sample_interval != 0 && i != samples.len() - 1 {
            continue;
        }
        println!(
            "  {:>7.2}  {:>7.2}  {:>7.2}  {:>7.2}  {:>8.2}  {:>7}",
            s.time,
            s.motion.pos.x,
            s.motion.pos.y,
            s.motion.pos.z,
            s.motion.vel.norm(),
            format!("{:?}", s.state)
        );
    }
    println!();

    let summary = FlightSummary::from_telemetry(&telemetry);
    if let Some(summary) = &summary {
        println!("  Performance Summary");
        println!("  ──────────────────────────────────────────────────────────────────");
        println!("  Distance flown:{:>8.1} m", summary.distance_m);
        println!("  Max speed:     {:>8.2} m/s", summary.max_speed);
        println!("  Max altitude:  {:>8.2} m", summary.max_altitude);
        println!(
            "  Final pos:     ({:.2}, {:.2}, {:.2})",
            summary.final_pos.x, summary.final_pos.y, summary.final_pos.z
        );
        println!();
    }

    if let Some(path) = &args.csv {
        write_telemetry_file(path, &telemetry)?;
        log::info!("Telemetry written to {}", path.display());
    }
    if let (Some(path), Some(summary)) = (&args.summary, &summary) {
        write_summary_file(path, &config.name, summary)?;
        log::info!("Summary written to {}", path.display());
    }

    println!("  Simulation: {} steps, dt={} s, {} telemetry records", samples.len(), sim.dt, telemetry.len());
    println!("====================================================================");
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_config_and_outputs() {
        let args = Args::try_parse_from(["quad-autopilot", "cfg.toml", "--csv", "out.csv"]).unwrap();
        assert_eq!(args.config, Some(PathBuf::from("cfg.toml")));
        assert_eq!(args.csv, Some(PathBuf::from("out.csv")));
        assert!(args.summary.is_none());
    }

    #[test]
    fn csv_flag_requires_a_path() {
        assert!(Args::try_parse_from(["quad-autopilot", "cfg.toml", "--csv"]).is_err());
    }

    #[test]
    fn unknown_flag_is_rejected() {
        assert!(Args::try_parse_from(["quad-autopilot", "--cvs", "out.csv"]).is_err());
    }
}
