//! # Transmission Scheduler
//!
//! Paces departures against link occupancy. A message leaves at once if its
//! path is idle, otherwise it is deferred to the path's transmission finish
//! time. Both roles go through it: the talker for block copies, the switch
//! for acks. Block copies are stamped with their actual departure time so
//! the receiver can measure one-way transit.

use tracing::trace;

use crate::context::{NodeContext, PathId, SimTime};
use crate::wire::{Block, Message};

#[derive(Debug, Default, Clone, Copy)]
pub struct TransmissionScheduler;

impl TransmissionScheduler {
    pub fn new() -> Self {
        TransmissionScheduler
    }

    /// Send one copy of `block` on `path`, stamped with its departure time.
    /// Returns the departure time.
    pub fn dispatch(&self, mut block: Block, path: PathId, ctx: &mut impl NodeContext) -> SimTime {
        block.send_time = self.departure(path, &*ctx);
        trace!(
            stream_id = block.stream_id,
            idx = block.idx,
            is_parity = block.is_parity,
            %path,
            depart_s = block.send_time.as_secs_f64(),
            "dispatch block"
        );
        self.dispatch_message(Message::Data(block), path, ctx)
    }

    /// Hand `msg` to `path` as soon as the path is idle: now if it already
    /// is, otherwise at its transmission finish time. Returns the departure
    /// time.
    pub fn dispatch_message(
        &self,
        msg: Message,
        path: PathId,
        ctx: &mut impl NodeContext,
    ) -> SimTime {
        let now = ctx.now();
        let depart = self.departure(path, &*ctx);
        if depart == now {
            ctx.send(msg, path);
        } else {
            ctx.send_delayed(msg, depart - now, path);
        }
        depart
    }

    fn departure(&self, path: PathId, ctx: &impl NodeContext) -> SimTime {
        ctx.link_finish_time(path).max(ctx.now())
    }

    /// Latest finish time over every path of the egress gate, never earlier
    /// than now.
    pub fn max_finish_time(&self, ctx: &impl NodeContext) -> SimTime {
        (0..ctx.path_count())
            .map(|i| ctx.link_finish_time(PathId(i)))
            .fold(ctx.now(), SimTime::max)
    }
}
