//! # Node Context
//!
//! The seam between the protocol core and whatever drives it (the
//! discrete-event simulator, or a test harness). Every observation of time
//! and every side effect on links and timers goes through this trait; the
//! protocol components themselves hold no clocks and no sockets.

use std::time::Duration;

use crate::wire::Message;

/// Simulated time, measured from the start of the run.
pub type SimTime = Duration;

/// Index of one path on a node's egress gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PathId(pub usize);

impl std::fmt::Display for PathId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "path{}", self.0)
    }
}

/// Collaborator interface a node needs from its environment.
pub trait NodeContext {
    /// Current simulated time.
    fn now(&self) -> SimTime;

    /// Number of paths bound to this node's egress gate.
    fn path_count(&self) -> usize;

    /// Time at which the channel on `path` finishes its current transmission.
    /// A value `<= now()` means the path is idle.
    fn link_finish_time(&self, path: PathId) -> SimTime;

    /// Hand a message to the channel on `path` right now.
    fn send(&mut self, msg: Message, path: PathId);

    /// Hand a message to the channel on `path` after `delay`.
    fn send_delayed(&mut self, msg: Message, delay: Duration, path: PathId);

    /// Register a wake-up for this node at `at`.
    fn schedule_at(&mut self, at: SimTime);
}
