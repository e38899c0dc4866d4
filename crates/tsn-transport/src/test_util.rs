//! In-memory [`NodeContext`] for unit and integration tests.
//!
//! Records every send and timer instead of delivering them. Link finish
//! times are either set by hand or, with [`RecordingContext::with_datarate`],
//! advanced by each send the way a datarate channel would.

use std::time::Duration;

use crate::context::{NodeContext, PathId, SimTime};
use crate::wire::Message;

/// One message handed to the context.
#[derive(Debug, Clone, PartialEq)]
pub struct Sent {
    pub path: PathId,
    /// Delay passed to `send_delayed`, zero for `send`.
    pub delay: Duration,
    pub msg: Message,
}

#[derive(Debug)]
pub struct RecordingContext {
    now: SimTime,
    finish: Vec<SimTime>,
    datarate_bps: Option<u64>,
    sent: Vec<Sent>,
    timers: Vec<SimTime>,
}

impl RecordingContext {
    pub fn new(paths: usize) -> Self {
        RecordingContext {
            now: Duration::ZERO,
            finish: vec![Duration::ZERO; paths],
            datarate_bps: None,
            sent: Vec::new(),
            timers: Vec::new(),
        }
    }

    /// Every send occupies its path for `size * 8 / bps` from departure.
    pub fn with_datarate(mut self, bps: u64) -> Self {
        self.datarate_bps = Some(bps);
        self
    }

    pub fn set_now(&mut self, now: SimTime) {
        self.now = now;
    }

    pub fn set_finish_time(&mut self, path: PathId, at: SimTime) {
        self.finish[path.0] = at;
    }

    pub fn sent(&self) -> &[Sent] {
        &self.sent
    }

    pub fn take_sent(&mut self) -> Vec<Sent> {
        std::mem::take(&mut self.sent)
    }

    pub fn timers(&self) -> &[SimTime] {
        &self.timers
    }

    pub fn take_timers(&mut self) -> Vec<SimTime> {
        std::mem::take(&mut self.timers)
    }

    fn occupy(&mut self, path: PathId, depart: SimTime, msg: &Message) {
        if let Some(bps) = self.datarate_bps {
            let nanos = msg.size_bytes() as u128 * 8 * 1_000_000_000 / bps as u128;
            self.finish[path.0] = depart + Duration::from_nanos(nanos as u64);
        }
    }
}

impl NodeContext for RecordingContext {
    fn now(&self) -> SimTime {
        self.now
    }

    fn path_count(&self) -> usize {
        self.finish.len()
    }

    fn link_finish_time(&self, path: PathId) -> SimTime {
        self.finish[path.0]
    }

    fn send(&mut self, msg: Message, path: PathId) {
        self.occupy(path, self.now, &msg);
        self.sent.push(Sent {
            path,
            delay: Duration::ZERO,
            msg,
        });
    }

    fn send_delayed(&mut self, msg: Message, delay: Duration, path: PathId) {
        self.occupy(path, self.now + delay, &msg);
        self.sent.push(Sent { path, delay, msg });
    }

    fn schedule_at(&mut self, at: SimTime) {
        self.timers.push(at);
    }
}
