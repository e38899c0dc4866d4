//! # Event Engine
//!
//! Single-threaded discrete-event loop driving a talker and a switch.
//!
//! Responsibilities:
//! - Keep pending events in time order, FIFO among equal times
//! - Give each node a [`NodeContext`] bound to its own egress channels
//! - Turn every transmission into a delivery event at the peer, carrying
//!   the channel's bit-error verdict
//! - Stop when nothing is left to do or the time limit is passed

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, trace};
use tsn_transport::{Message, Node, NodeContext, NodeEvent, PathId, SimTime};

use crate::channel::DatarateChannel;
use crate::config::SimConfig;
use crate::error::SimError;
use crate::report::{NodeReport, SimReport};
use crate::topology::{NodeId, Topology};

// ─── Event Queue ─────────────────────────────────────────────────────────────

#[derive(Debug)]
struct Scheduled {
    at: SimTime,
    seq: u64,
    node: NodeId,
    event: NodeEvent,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.at == other.at && self.seq == other.seq
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        // Max-heap: earliest time first, then earliest insertion.
        other
            .at
            .cmp(&self.at)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Pending events, popped in `(time, insertion order)` order.
#[derive(Debug, Default)]
pub struct EventQueue {
    heap: BinaryHeap<Scheduled>,
    next_seq: u64,
}

impl EventQueue {
    pub fn new() -> Self {
        EventQueue::default()
    }

    pub fn push(&mut self, at: SimTime, node: NodeId, event: NodeEvent) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Scheduled {
            at,
            seq,
            node,
            event,
        });
    }

    pub fn pop(&mut self) -> Option<(SimTime, NodeId, NodeEvent)> {
        self.heap.pop().map(|s| (s.at, s.node, s.event))
    }

    pub fn peek_time(&self) -> Option<SimTime> {
        self.heap.peek().map(|s| s.at)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

// ─── Node Context ────────────────────────────────────────────────────────────

/// The environment one node sees while handling one event.
///
/// Channel faults cannot be returned through [`NodeContext`], so the first
/// one is parked here and surfaced by the engine after the handler returns.
struct SimContext<'a> {
    node: NodeId,
    now: SimTime,
    channels: &'a mut [DatarateChannel],
    rng: &'a mut StdRng,
    queue: &'a mut EventQueue,
    fault: Option<SimError>,
}

impl SimContext<'_> {
    fn transmit(&mut self, message: Message, delay: Duration, path: PathId) {
        if self.fault.is_some() {
            return;
        }
        let start = self.now + delay;
        let Some(channel) = self.channels.get_mut(path.0) else {
            self.fault = Some(SimError::UnknownPath {
                node: self.node,
                path,
            });
            return;
        };

        match channel.transmit(start, message.size_bytes(), self.rng) {
            Ok(tx) => {
                trace!(
                    node = %self.node,
                    %path,
                    stream_id = message.stream_id(),
                    start = ?start,
                    arrival = ?tx.arrival,
                    corrupted = tx.corrupted,
                    "transmission started"
                );
                self.queue.push(
                    tx.arrival,
                    self.node.peer(),
                    NodeEvent::Arrival {
                        message,
                        corrupted: tx.corrupted,
                    },
                );
            }
            Err(busy) => {
                self.fault = Some(SimError::ChannelBusy {
                    node: self.node,
                    path,
                    start,
                    busy_until: busy.busy_until,
                });
            }
        }
    }
}

impl NodeContext for SimContext<'_> {
    fn now(&self) -> SimTime {
        self.now
    }

    fn path_count(&self) -> usize {
        self.channels.len()
    }

    fn link_finish_time(&self, path: PathId) -> SimTime {
        self.channels
            .get(path.0)
            .map_or(Duration::ZERO, DatarateChannel::finish_time)
    }

    fn send(&mut self, msg: Message, path: PathId) {
        self.transmit(msg, Duration::ZERO, path);
    }

    fn send_delayed(&mut self, msg: Message, delay: Duration, path: PathId) {
        self.transmit(msg, delay, path);
    }

    fn schedule_at(&mut self, at: SimTime) {
        self.queue.push(at, self.node, NodeEvent::Wake);
    }
}

// ─── Simulation ──────────────────────────────────────────────────────────────

pub struct Simulation {
    seed: u64,
    nodes: [Node; 2],
    topology: Topology,
    queue: EventQueue,
    rng: StdRng,
    now: SimTime,
    events: u64,
    summary_interval: u64,
    time_limit: Option<SimTime>,
    truncated: bool,
}

impl Simulation {
    pub fn new(cfg: &SimConfig) -> Result<Self, SimError> {
        cfg.validate()?;
        Ok(Simulation {
            seed: cfg.seed,
            nodes: [
                Node::new("talker", cfg.talker.clone()),
                Node::new("switch", cfg.switch.clone()),
            ],
            topology: Topology::from_config(cfg),
            queue: EventQueue::new(),
            rng: StdRng::seed_from_u64(cfg.seed),
            now: Duration::ZERO,
            events: 0,
            summary_interval: cfg.summary_interval,
            time_limit: cfg.time_limit,
            truncated: false,
        })
    }

    pub fn now(&self) -> SimTime {
        self.now
    }

    pub fn events_handled(&self) -> u64 {
        self.events
    }

    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Initialize both nodes at time 0. The talker arms its first wake-up.
    pub fn start(&mut self) -> Result<(), SimError> {
        for id in NodeId::ALL {
            self.with_context(id, |node, ctx| node.start(ctx))?;
        }
        info!(
            seed = self.seed,
            paths = self.topology.egress(NodeId::Talker).len(),
            time_limit = ?self.time_limit,
            "simulation started"
        );
        Ok(())
    }

    /// Handle the next event. Returns `false` once the run is over.
    pub fn step(&mut self) -> Result<bool, SimError> {
        let Some(at) = self.queue.peek_time() else {
            return Ok(false);
        };
        if let Some(limit) = self.time_limit {
            if at > limit {
                self.now = limit;
                self.truncated = true;
                return Ok(false);
            }
        }
        let Some((at, id, event)) = self.queue.pop() else {
            return Ok(false);
        };
        self.now = at;

        self.with_context(id, |node, ctx| {
            let outcome = node.handle(event, ctx)?;
            trace!(node = %id, ?outcome, "event handled");
            Ok(())
        })?;

        self.events += 1;
        if self.summary_interval > 0 && self.events % self.summary_interval == 0 {
            self.log_progress();
        }
        Ok(true)
    }

    /// Run to completion and produce the final report.
    pub fn run(mut self) -> Result<SimReport, SimError> {
        self.start()?;
        while self.step()? {}
        if self.truncated {
            info!(
                pending = self.queue.len(),
                now = ?self.now,
                "time limit reached"
            );
        }
        Ok(self.finish())
    }

    pub fn finish(&self) -> SimReport {
        let report = |id: NodeId| {
            let node = self.node(id);
            NodeReport {
                display: node.display_text(),
                stats: node.stats().clone(),
                summary: node.finish(),
                channels: self.topology.channel_stats(id),
            }
        };
        SimReport {
            seed: self.seed,
            end_time_s: self.now.as_secs_f64(),
            events: self.events,
            truncated: self.truncated,
            talker: report(NodeId::Talker),
            switch: report(NodeId::Switch),
        }
    }

    fn log_progress(&self) {
        info!(
            now = ?self.now,
            events = self.events,
            talker = %self.node(NodeId::Talker).display_text(),
            switch = %self.node(NodeId::Switch).display_text(),
            "progress"
        );
    }

    fn with_context<F>(&mut self, id: NodeId, f: F) -> Result<(), SimError>
    where
        F: FnOnce(&mut Node, &mut SimContext<'_>) -> Result<(), tsn_transport::TransportError>,
    {
        let Simulation {
            nodes,
            topology,
            queue,
            rng,
            now,
            ..
        } = self;
        let mut ctx = SimContext {
            node: id,
            now: *now,
            channels: topology.egress_mut(id),
            rng,
            queue,
            fault: None,
        };
        let result = f(&mut nodes[id.index()], &mut ctx);
        if let Some(fault) = ctx.fault.take() {
            debug!(node = %id, error = %fault, "channel fault");
            return Err(fault);
        }
        result.map_err(|source| SimError::Node { node: id, source })
    }
}
