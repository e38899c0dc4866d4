//! # Acknowledgment Handler
//!
//! Talker-side processing of acks. The first ack for a stream counts it as
//! delivered and frees every retained copy in the send pool; later acks for
//! the same stream are no-ops.
//!
//! An ack the return link flagged as corrupted cannot be trusted to name the
//! right stream and is dropped. There is no retransmission timer: a stream
//! whose ack never arrives intact keeps its send-pool entry until the node is
//! dropped.

use tracing::debug;

use crate::completion::CompletedSet;
use crate::pool::BlockPool;
use crate::stats::NodeStats;
use crate::wire::{Ack, StreamId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckOutcome {
    /// Return link flagged a bit error; dropped.
    Corrupted,
    /// Stream already delivered.
    Duplicate,
    /// First ack for the stream; `released` retained copies were freed.
    Delivered { stream_id: StreamId, released: usize },
}

#[derive(Debug, Default, Clone, Copy)]
pub struct AcknowledgmentHandler;

impl AcknowledgmentHandler {
    pub fn new() -> Self {
        AcknowledgmentHandler
    }

    pub fn on_ack(
        &self,
        ack: Ack,
        corrupted: bool,
        completed: &mut CompletedSet,
        send_pool: &mut BlockPool,
        stats: &mut NodeStats,
    ) -> AckOutcome {
        let stream_id = ack.stream_id;
        if corrupted {
            stats.acks_corrupted += 1;
            debug!(stream_id, "dropping corrupted ack");
            return AckOutcome::Corrupted;
        }
        if !completed.try_complete(stream_id) {
            stats.duplicate_acks += 1;
            return AckOutcome::Duplicate;
        }

        stats.streams_delivered += 1;
        let released = send_pool.release(stream_id);
        debug!(stream_id, released, "ack received, stream delivered");

        AckOutcome::Delivered {
            stream_id,
            released,
        }
    }
}
