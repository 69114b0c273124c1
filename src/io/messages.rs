//! Messages exchanged with the messaging layer.
//!
//! Inbound traffic (flight plans, remote commands) arrives on a bounded
//! channel. The messaging side holds a cloneable [`InboxSender`]; the vehicle
//! owns the [`Inbox`] and drains it on its own schedule, so a plan is only
//! ever seen whole.

use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::gnc::plan::FlightPlan;

// ---------------------------------------------------------------------------
// Time stamps
// ---------------------------------------------------------------------------

/// Wire time stamp: whole seconds plus nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Stamp {
    pub sec: i32,
    pub nanosec: u32,
}

impl Stamp {
    pub fn from_secs(t: f64) -> Self {
        let sec = t.floor();
        let mut nanosec = ((t - sec) * 1e9).round() as u32;
        let mut sec = sec as i32;
        if nanosec >= 1_000_000_000 {
            sec += 1;
            nanosec -= 1_000_000_000;
        }
        Self { sec, nanosec }
    }

    pub fn as_secs(&self) -> f64 {
        self.sec as f64 + self.nanosec as f64 * 1e-9
    }
}

// ---------------------------------------------------------------------------
// Inbound messages
// ---------------------------------------------------------------------------

/// Velocity command from a remote operator, horizon frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RemoteCommand {
    pub on: bool,
    pub velocity: Vector3<f64>, // m/s
    pub yaw_rate: f64,          // rad/s
    pub duration: f64,          // s, from delivery
}

impl RemoteCommand {
    pub fn velocity(velocity: Vector3<f64>, yaw_rate: f64, duration: f64) -> Self {
        Self { on: true, velocity, yaw_rate, duration }
    }

    /// Motors off.
    pub fn stop() -> Self {
        Self { on: false, velocity: Vector3::zeros(), yaw_rate: 0.0, duration: 0.0 }
    }
}

#[derive(Debug, Clone)]
pub enum Inbound {
    FlightPlan(Arc<FlightPlan>),
    RemoteCommand(RemoteCommand),
}

impl Inbound {
    pub fn kind(&self) -> &'static str {
        match self {
            Inbound::FlightPlan(_) => "flight plan",
            Inbound::RemoteCommand(_) => "remote command",
        }
    }
}

// ---------------------------------------------------------------------------
// Inbox channel
// ---------------------------------------------------------------------------

/// Create a bounded inbox holding at most `capacity` undelivered messages.
pub fn inbox(capacity: usize) -> (InboxSender, Inbox) {
    let (tx, rx) = bounded(capacity);
    (InboxSender { tx }, Inbox { rx })
}

/// Messaging-layer end of the inbox.
#[derive(Debug, Clone)]
pub struct InboxSender {
    tx: Sender<Inbound>,
}

impl InboxSender {
    /// Queue a message without blocking.
    pub fn send(&self, msg: Inbound) -> Result<()> {
        let kind = msg.kind();
        self.tx.try_send(msg).map_err(|e| match e {
            TrySendError::Full(_) => Error::InboxFull(kind),
            TrySendError::Disconnected(_) => Error::Disconnected("inbox"),
        })
    }

    pub fn send_plan(&self, plan: FlightPlan) -> Result<()> {
        self.send(Inbound::FlightPlan(Arc::new(plan)))
    }

    pub fn send_command(&self, cmd: RemoteCommand) -> Result<()> {
        self.send(Inbound::RemoteCommand(cmd))
    }
}

/// Vehicle end of the inbox.
#[derive(Debug)]
pub struct Inbox {
    rx: Receiver<Inbound>,
}

impl Inbox {
    /// Everything queued right now, oldest first. Never blocks.
    pub fn drain(&self) -> Vec<Inbound> {
        self.rx.try_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
