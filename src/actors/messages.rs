//! Message types for actor communication
//!
//! 1. **Commands**: request/response messages sent to one actor via mpsc
//! 2. **Events**: cycle reports broadcast to every subscriber

use std::sync::Arc;

use tokio::sync::oneshot;

use crate::cycle::CycleReport;

/// Event published after every poll cycle
///
/// Wrapped in an `Arc` so fan-out does not copy the readings. Slow
/// subscribers may lag and miss events; the aggregates themselves are
/// always current.
pub type CycleEvent = Arc<CycleReport>;

/// Commands that can be sent to the CollectorActor
#[derive(Debug)]
pub enum CollectorCommand {
    /// Run a cycle right away, outside the interval timer
    PollNow {
        respond_to: oneshot::Sender<CycleEvent>,
    },

    /// Change the poll interval, effective from the next tick
    UpdateInterval { interval_secs: u64 },

    /// Close the controller session and stop
    ///
    /// The acknowledgement is sent after the session is closed.
    Shutdown { respond_to: oneshot::Sender<()> },
}

/// Commands that can be sent to the AlertActor
#[derive(Debug)]
pub enum AlertCommand {
    /// Suppress notifications for a duration, e.g. during maintenance
    Mute { duration_secs: u64 },

    Unmute,

    IsMuted { respond_to: oneshot::Sender<bool> },

    Shutdown,
}

/// Commands that can be sent to a ReportActor
#[derive(Debug)]
pub enum ReportCommand {
    /// Render and dispatch a report immediately, returning its text
    ReportNow { respond_to: oneshot::Sender<String> },

    Shutdown,
}
