//! # Reception Aggregator
//!
//! Switch-side buffering of arriving blocks and the completion decision.
//!
//! 1. **Corrupted** blocks are dropped; redundancy absorbs the loss.
//! 2. **Out-of-range** blocks (data `idx >= k`, parity `idx >= m`) are
//!    dropped before they can count toward completion.
//! 3. **Late** blocks (stream already complete) are dropped.
//! 4. Intact blocks go into the data or parity pool by index. A repeated
//!    index overwrites, so copies from redundant paths count once.
//! 5. **Completion**: coding mode needs `data + parity >= k`; duplication
//!    mode needs all `k` distinct data indices. On completion the stream is
//!    marked complete, exactly one ack is queued on the return path and the
//!    stream's buffers are released.

use tracing::{debug, warn};

use crate::completion::CompletedSet;
use crate::config::{NodeConfig, RedundancyMode};
use crate::context::{NodeContext, PathId};
use crate::pool::BlockPool;
use crate::scheduler::TransmissionScheduler;
use crate::stats::NodeStats;
use crate::wire::{Ack, Block, Message, StreamId};

/// Egress path acks leave on.
pub const ACK_PATH: PathId = PathId(0);

/// What happened to one arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrivalOutcome {
    /// Channel flagged a bit error; dropped.
    Corrupted,
    /// Index outside `0..k` (data) or `0..m` (parity); dropped.
    OutOfRange,
    /// Stream already complete; dropped.
    Late,
    /// Stored; stream not yet reconstructable.
    Buffered { held: usize },
    /// This arrival completed the stream and an ack was sent.
    Completed { stream_id: StreamId },
}

pub struct ReceptionAggregator {
    mode: RedundancyMode,
    k: u32,
    m: u32,
    scheduler: TransmissionScheduler,
    data: BlockPool,
    parity: BlockPool,
}

impl ReceptionAggregator {
    pub fn new(config: &NodeConfig) -> Self {
        ReceptionAggregator {
            mode: config.mode,
            k: config.k,
            m: config.m,
            scheduler: TransmissionScheduler::new(),
            data: BlockPool::new(),
            parity: BlockPool::new(),
        }
    }

    /// Distinct data blocks held for `stream_id`.
    pub fn data_held(&self, stream_id: StreamId) -> usize {
        self.data.count(stream_id)
    }

    /// Distinct parity blocks held for `stream_id`.
    pub fn parity_held(&self, stream_id: StreamId) -> usize {
        self.parity.count(stream_id)
    }

    /// Blocks still buffered across all incomplete streams.
    pub fn buffered_blocks(&self) -> usize {
        self.data.total_blocks() + self.parity.total_blocks()
    }

    pub fn on_arrival(
        &mut self,
        block: Block,
        corrupted: bool,
        completed: &mut CompletedSet,
        stats: &mut NodeStats,
        ctx: &mut impl NodeContext,
    ) -> ArrivalOutcome {
        let stream_id = block.stream_id;

        if corrupted {
            stats.blocks_corrupted += 1;
            debug!(
                stream_id,
                idx = block.idx,
                is_parity = block.is_parity,
                "dropping corrupted block"
            );
            return ArrivalOutcome::Corrupted;
        }

        if !self.in_range(&block) {
            stats.blocks_out_of_range += 1;
            warn!(
                stream_id,
                idx = block.idx,
                is_parity = block.is_parity,
                k = self.k,
                m = self.m,
                "dropping block with out-of-range index"
            );
            return ArrivalOutcome::OutOfRange;
        }

        stats.blocks_received += 1;
        let transit = ctx.now().saturating_sub(block.send_time);
        stats.transit.record(transit);
        debug!(
            stream_id,
            idx = block.idx,
            is_parity = block.is_parity,
            transit_s = transit.as_secs_f64(),
            "block received"
        );

        if completed.contains(stream_id) {
            stats.blocks_late += 1;
            return ArrivalOutcome::Late;
        }

        if block.is_parity {
            self.parity.insert(block);
        } else {
            self.data.insert(block);
        }

        if !self.is_reconstructable(stream_id) || !completed.try_complete(stream_id) {
            return ArrivalOutcome::Buffered {
                held: self.data.count(stream_id) + self.parity.count(stream_id),
            };
        }

        let depart = self
            .scheduler
            .dispatch_message(Message::Ack(Ack { stream_id }), ACK_PATH, ctx);
        debug!(
            stream_id,
            depart_s = depart.as_secs_f64(),
            "stream complete, ack queued"
        );
        stats.acks_sent += 1;
        stats.streams_completed += 1;

        self.data.release(stream_id);
        self.parity.release(stream_id);

        ArrivalOutcome::Completed { stream_id }
    }

    /// Whether the block's index exists in a stream of this configuration.
    /// Duplication mode has `m = 0`, so every parity block is out of range.
    pub fn in_range(&self, block: &Block) -> bool {
        let bound = if block.is_parity { self.m } else { self.k };
        block.idx < bound
    }

    /// Mode-specific completion predicate. Safe to evaluate repeatedly.
    pub fn is_reconstructable(&self, stream_id: StreamId) -> bool {
        let k = self.k as usize;
        match self.mode {
            RedundancyMode::Coding => {
                self.data.count(stream_id) + self.parity.count(stream_id) >= k
            }
            RedundancyMode::Duplication => self.data.count(stream_id) == k,
        }
    }
}
