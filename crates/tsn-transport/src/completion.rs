//! Set of streams already judged complete on a node.
//!
//! The single arbitration point between the two completion triggers: the
//! switch's reception path and the talker's acknowledgment path. Membership
//! is terminal.

use std::collections::HashSet;

use crate::wire::StreamId;

#[derive(Debug, Default)]
pub struct CompletedSet {
    streams: HashSet<StreamId>,
}

impl CompletedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, stream_id: StreamId) -> bool {
        self.streams.contains(&stream_id)
    }

    /// Check-then-insert as one step. Returns `true` only for the call that
    /// moved `stream_id` into the set.
    pub fn try_complete(&mut self, stream_id: StreamId) -> bool {
        self.streams.insert(stream_id)
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}
