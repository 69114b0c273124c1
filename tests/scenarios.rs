use std::sync::Arc;

use approx::assert_relative_eq;
use nalgebra::{Vector3, Vector4};

use quad_autopilot::config::VehicleConfig;
use quad_autopilot::dynamics::{forces, ControlReference, RotorCommand, VehicleMotion};
use quad_autopilot::gnc::{
    CommandSupervisor, FixedTestCommand, FlightPlan, FlightPlanBuilder, LqiController,
    ReferenceSource, RemoteCommandSource, SupervisorState, WaypointNavigator,
};
use quad_autopilot::io::{inbox, RemoteCommand};
use quad_autopilot::sim::{simulate, Autopilot, FreeBody, MassProperties, RigidBody, SimConfig};

fn body(config: &VehicleConfig, pos: Vector3<f64>) -> FreeBody {
    FreeBody::new(MassProperties::minidrone(&config.airframe), pos)
}

fn three_leg_plan(start: f64) -> FlightPlan {
    FlightPlanBuilder::new(42)
        .waypoint(0.0, 0.0, 1.0, start)
        .waypoint(5.0, 0.0, 1.0, start + 5.0)
        .waypoint(5.0, 5.0, 2.0, start + 10.0)
        .build()
        .unwrap()
}

// ---------------------------------------------------------------------------
// Feedback controller
// ---------------------------------------------------------------------------

#[test]
fn forward_turn_converges() {
    let cfg = VehicleConfig::minidrone();
    let mut ap = Autopilot::new(&cfg, Box::new(FixedTestCommand::forward_turn()));
    let mut b = body(&cfg, Vector3::new(0.0, 0.0, 1.0));
    let samples = simulate(&mut ap, &mut b, &SimConfig { dt: 0.002, max_time: 15.0 });

    let m = samples.last().unwrap().motion;
    assert!((m.vel.x - 2.0).abs() < 0.05, "vx = {}", m.vel.x);
    assert!(m.vel.y.abs() < 0.05, "vy = {}", m.vel.y);
    assert!(m.vel.z.abs() < 0.05, "vz = {}", m.vel.z);
    assert!((m.omega.z - 1.0).abs() < 0.02, "yaw rate = {}", m.omega.z);
    assert!(m.pos.z > 0.5, "vehicle sank to {}", m.pos.z);
    assert!(samples.iter().all(|s| s.state == SupervisorState::Active));
}

#[test]
fn rotor_speeds_respect_bounds_in_flight() {
    let cfg = VehicleConfig::minidrone();
    let mut ap = Autopilot::new(&cfg, Box::new(FixedTestCommand::forward_turn()));
    let mut b = body(&cfg, Vector3::new(0.0, 0.0, 1.0));
    let samples = simulate(&mut ap, &mut b, &SimConfig { dt: 0.002, max_time: 5.0 });
    for s in &samples {
        for w in s.rotors.to_vector().iter() {
            assert!(*w >= cfg.airframe.w_min && *w <= cfg.airframe.w_max, "w = {} at {}", w, s.time);
        }
    }
}

#[test]
fn clock_rewind_resets_controller() {
    let cfg = VehicleConfig::minidrone();
    let mut c = LqiController::new(&cfg);
    let m = VehicleMotion::at_rest(Vector3::new(0.0, 0.0, 1.0));
    let r = ControlReference::new(Vector3::new(1.0, -1.0, 0.5), 0.3);
    for i in 0..50 {
        c.update(3.0 + i as f64 * 0.02, &m, &r);
    }
    assert!(c.integral_error().norm() > 0.0);
    assert!(c.update(0.5, &m, &r).is_off());
    assert_eq!(c.integral_error(), Vector4::zeros());
}

#[test]
fn disengaged_controller_outputs_zero() {
    let cfg = VehicleConfig::dc_autopilot();
    let mut c = LqiController::new(&cfg);
    let mut m = VehicleMotion::at_rest(Vector3::new(0.0, 0.0, 1.0));
    m.vel = Vector3::new(3.0, 0.0, -1.0);
    assert_eq!(c.update(1.0, &m, &ControlReference::off()), RotorCommand::OFF);
    assert!(!c.is_engaged());
}

// ---------------------------------------------------------------------------
// Waypoint navigator
// ---------------------------------------------------------------------------

#[test]
fn navigator_interpolates_with_lookahead() {
    let plan = FlightPlanBuilder::new(1)
        .waypoint(0.0, 0.0, 0.0, 0.0)
        .waypoint(10.0, 0.0, 0.0, 10.0)
        .build()
        .unwrap();
    assert_eq!(plan.planned_index(5.0), 1);
    assert_relative_eq!(plan.planned_position(1, 5.0 + 0.1), Vector3::new(5.1, 0.0, 0.0), epsilon = 1e-9);
}

#[test]
fn late_plan_is_discarded() {
    let cfg = VehicleConfig::minidrone();
    let mut nav = WaypointNavigator::new(&cfg.timing);
    nav.load_plan(Arc::new(three_leg_plan(0.0)));
    // Planned index is 2 on first look
    let here = VehicleMotion::at_rest(Vector3::zeros());
    assert!(nav.navigate(6.0, &here).is_none());
    assert!(nav.plan().is_none());
    assert!(nav.navigate(6.5, &here).is_none());
    assert_eq!(nav.current_waypoint_index(), -1);
}

#[test]
fn late_plan_never_starts_motors() {
    let cfg = VehicleConfig::minidrone();
    let (tx, rx) = inbox(4);
    let nav = WaypointNavigator::new(&cfg.timing);
    let mut ap = Autopilot::new(&cfg, Box::new(nav)).with_inbox(rx);
    let mut b = body(&cfg, Vector3::zeros());
    // Delivered at t = 2, after the first waypoint time
    tx.send_plan(three_leg_plan(0.5)).unwrap();
    let samples = simulate(&mut ap, &mut b, &SimConfig { dt: 0.01, max_time: 6.0 });
    assert!(samples.iter().all(|s| s.rotors.is_off()));
    assert_eq!(b.state().pos.z, 0.0);
}

#[test]
fn flies_plan_and_lands_after_expiry() {
    let cfg = VehicleConfig::minidrone();
    let (tx, rx) = inbox(4);
    let nav = WaypointNavigator::new(&cfg.timing);
    let mut ap = Autopilot::new(&cfg, Box::new(nav)).with_inbox(rx);
    let mut b = body(&cfg, Vector3::zeros());
    tx.send_plan(three_leg_plan(3.0)).unwrap();

    let dt = 0.002;
    let mut at_wp1 = None;
    let mut at_wp2 = None;
    let mut states = Vec::new();
    while b.sim_time() < 16.0 {
        let t = b.sim_time();
        let r = ap.tick(&mut b);
        states.push((t, r.state, r.rotors));
        if at_wp1.is_none() && t >= 8.0 {
            at_wp1 = Some(b.motion().pos);
        }
        if at_wp2.is_none() && t >= 12.9 {
            at_wp2 = Some(b.motion().pos);
        }
        b.step(dt);
    }

    // Waiting on the ground until the first waypoint time
    assert!(states.iter().filter(|(t, ..)| *t < 2.9).all(|(_, s, r)| *s == SupervisorState::Off && r.is_off()));

    let p1 = at_wp1.unwrap();
    assert!((p1 - Vector3::new(5.0, 0.0, 1.0)).norm() < 1.0, "at t=8: {:?}", p1);
    let p2 = at_wp2.unwrap();
    assert!((p2 - Vector3::new(5.0, 5.0, 2.0)).norm() < 1.2, "at t=12.9: {:?}", p2);

    // Route exhausted: motors off, vehicle back on the ground
    assert!(states.iter().filter(|(t, ..)| *t > 13.1).all(|(_, s, r)| *s == SupervisorState::Off && r.is_off()));
    assert_eq!(b.state().pos.z, 0.0);
}

// ---------------------------------------------------------------------------
// Command supervisor
// ---------------------------------------------------------------------------

#[test]
fn zero_duration_remote_command_hovers() {
    let cfg = VehicleConfig::minidrone();
    let (tx, rx) = inbox(4);
    let mut ap = Autopilot::new(&cfg, Box::new(RemoteCommandSource::new())).with_inbox(rx);
    let mut b = body(&cfg, Vector3::new(0.0, 0.0, 1.0));
    tx.send_command(RemoteCommand::velocity(Vector3::new(1.0, 0.0, 0.0), 0.5, 0.0)).unwrap();

    let mut delivered = false;
    while b.sim_time() < 3.0 {
        let r = ap.tick(&mut b);
        if delivered {
            // First tick after delivery
            assert_eq!(r.state, SupervisorState::Hover);
            assert!(r.rotors.to_vector().iter().all(|w| *w > 0.0));
            return;
        }
        delivered = r.messages_received > 0;
        b.step(0.002);
    }
    panic!("remote command never delivered");
}

#[test]
fn remote_stop_cuts_motors() {
    let mut s = CommandSupervisor::new(4.0);
    let mut src = RemoteCommandSource::new();
    let here = VehicleMotion::at_rest(Vector3::zeros());

    src.on_remote_command(RemoteCommand::velocity(Vector3::new(20.0, 0.0, 0.0), 0.0, 10.0), 0.0);
    let d = s.step(0.01, src.produce_reference(0.01, &here));
    assert_eq!(d.reference().unwrap().velocity.x, 4.0);

    src.on_remote_command(RemoteCommand::stop(), 0.5);
    s.step(0.51, src.produce_reference(0.51, &here));
    assert_eq!(s.state(), SupervisorState::Off);
}

#[test]
fn non_finite_remote_command_keeps_rotors_bounded() {
    let cfg = VehicleConfig::minidrone();
    let a = &cfg.airframe;
    let mut s = CommandSupervisor::new(cfg.timing.remote_limit);
    let mut src = RemoteCommandSource::new();
    let mut c = LqiController::new(&cfg);
    let here = VehicleMotion::at_rest(Vector3::new(0.0, 0.0, 1.0));

    let check = |u: RotorCommand, t: f64| {
        for w in u.to_vector().iter() {
            assert!(w.is_finite() && *w >= a.w_min && *w <= a.w_max, "w = {} at {}", w, t);
        }
    };

    src.on_remote_command(RemoteCommand::velocity(Vector3::new(f64::NAN, 0.0, 0.0), f64::NAN, 5.0), 0.0);
    for i in 0..50 {
        let t = i as f64 * 0.02;
        let d = s.step(t, src.produce_reference(t, &here));
        check(c.update(t, &here, d.reference().unwrap()), t);
    }
    assert!(c.integral_error().iter().all(|e| e.is_finite()));

    // A later valid command is tracked normally
    src.on_remote_command(RemoteCommand::velocity(Vector3::new(1.0, 0.0, 0.0), 0.0, 5.0), 1.0);
    for i in 50..100 {
        let t = i as f64 * 0.02;
        let d = s.step(t, src.produce_reference(t, &here));
        assert_eq!(s.state(), SupervisorState::Active);
        check(c.update(t, &here, d.reference().unwrap()), t);
    }
    assert!(c.integral_error()[0] < 0.0);
}

#[test]
fn nan_duration_remote_command_hovers() {
    let mut s = CommandSupervisor::new(4.0);
    let mut src = RemoteCommandSource::new();
    let here = VehicleMotion::at_rest(Vector3::zeros());
    src.on_remote_command(RemoteCommand::velocity(Vector3::new(1.0, 0.0, 0.0), 0.0, f64::NAN), 2.0);
    let d = s.step(2.01, src.produce_reference(2.01, &here));
    assert_eq!(s.state(), SupervisorState::Hover);
    assert_eq!(d.reference().unwrap().velocity, Vector3::zeros());
}

#[test]
fn world_reset_lands_in_off() {
    let cfg = VehicleConfig::minidrone();
    let (tx, rx) = inbox(4);
    let mut ap = Autopilot::new(&cfg, Box::new(RemoteCommandSource::new())).with_inbox(rx);
    let mut b = body(&cfg, Vector3::new(0.0, 0.0, 1.0));
    tx.send_command(RemoteCommand::velocity(Vector3::zeros(), 0.0, 100.0)).unwrap();
    simulate(&mut ap, &mut b, &SimConfig { dt: 0.01, max_time: 3.0 });
    assert_eq!(ap.supervisor_state(), SupervisorState::Active);

    b.set_time(0.0);
    let r = ap.tick(&mut b);
    assert_eq!(r.state, SupervisorState::Reset);
    assert!(r.rotors.is_off());
    b.step(0.01);
    let r = ap.tick(&mut b);
    assert_eq!(r.state, SupervisorState::Off);
    assert!(r.rotors.is_off());
}

// ---------------------------------------------------------------------------
// Dynamics model
// ---------------------------------------------------------------------------

#[test]
fn hover_speed_gives_steady_hover() {
    let cfg = VehicleConfig::minidrone();
    let a = &cfg.airframe;
    let m = VehicleMotion::at_rest(Vector3::new(0.0, 0.0, 1.0));
    let f = forces(a, &RotorCommand::uniform(a.hover_speed()), &m);
    assert_relative_eq!(f.net_force(), Vector3::new(0.0, 0.0, a.mass * a.gravity), epsilon = 1e-9);
    assert_relative_eq!(f.net_torque(), Vector3::zeros(), epsilon = 1e-12);
    assert_eq!(f.drag_torque, Vector3::zeros());
}

#[test]
fn hover_holds_free_body_in_place() {
    let cfg = VehicleConfig::minidrone();
    let a = &cfg.airframe;
    let mut b = body(&cfg, Vector3::new(0.0, 0.0, 3.0));
    for _ in 0..500 {
        let f = forces(a, &RotorCommand::uniform(a.hover_speed()), &b.motion());
        f.apply_to(&mut b);
        b.step(0.002);
    }
    assert_relative_eq!(b.state().pos, Vector3::new(0.0, 0.0, 3.0), epsilon = 1e-6);
}
