//! # Per-Stream Block Pool
//!
//! Slab-backed arena of per-stream block records. Each stream occupies one
//! slot holding its blocks keyed by [`BlockKey`]; releasing a stream frees
//! the whole slot in one step. The same type backs the talker's send buffer
//! and the switch's data and parity receive buffers.

use slab::Slab;
use std::collections::{BTreeMap, HashMap};

use crate::wire::{Block, BlockKey, StreamId};

/// Blocks held for one stream.
#[derive(Debug, Default)]
pub struct StreamBlocks {
    blocks: BTreeMap<BlockKey, Block>,
}

impl StreamBlocks {
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }
}

/// Handle to a stream slot in the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotHandle(pub usize);

/// Arena of per-stream block records.
#[derive(Debug, Default)]
pub struct BlockPool {
    slots: Slab<StreamBlocks>,
    /// Maps stream id → slot for lookups.
    index: HashMap<StreamId, SlotHandle>,
}

impl BlockPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a block under its stream. A block with the same key replaces the
    /// one already held, so repeated arrivals of one index count once.
    ///
    /// Returns `true` if the key was new for this stream.
    pub fn insert(&mut self, block: Block) -> bool {
        let stream_id = block.stream_id;
        let handle = match self.index.get(&stream_id) {
            Some(&h) => h,
            None => {
                let key = self.slots.insert(StreamBlocks {
                    blocks: BTreeMap::new(),
                });
                let h = SlotHandle(key);
                self.index.insert(stream_id, h);
                h
            }
        };
        self.slots[handle.0]
            .blocks
            .insert(block.key(), block)
            .is_none()
    }

    /// Blocks held for `stream_id`, if any.
    pub fn get(&self, stream_id: StreamId) -> Option<&StreamBlocks> {
        let handle = self.index.get(&stream_id)?;
        self.slots.get(handle.0)
    }

    /// Number of distinct blocks held for `stream_id`.
    pub fn count(&self, stream_id: StreamId) -> usize {
        self.get(stream_id).map_or(0, StreamBlocks::block_count)
    }

    /// Drop every block of `stream_id`, returning how many were held.
    pub fn release(&mut self, stream_id: StreamId) -> usize {
        match self.index.remove(&stream_id) {
            Some(handle) => self.slots.remove(handle.0).block_count(),
            None => 0,
        }
    }

    /// Number of streams with at least one block held.
    pub fn streams(&self) -> usize {
        self.slots.len()
    }

    /// Total blocks held across all streams.
    pub fn total_blocks(&self) -> usize {
        self.slots.iter().map(|(_, s)| s.block_count()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_count() {
        let mut pool = BlockPool::new();
        assert!(pool.insert(Block::data(1, 0, 10)));
        assert!(pool.insert(Block::data(1, 1, 10)));
        assert!(pool.insert(Block::parity(1, 0, 10)));
        assert_eq!(pool.count(1), 3);
        assert_eq!(pool.count(2), 0);
        assert_eq!(pool.streams(), 1);
    }

    #[test]
    fn repeated_key_overwrites() {
        let mut pool = BlockPool::new();
        assert!(pool.insert(Block::data(3, 2, 10)));
        assert!(!pool.insert(Block::data(3, 2, 10)));
        assert_eq!(pool.count(3), 1);
    }

    #[test]
    fn release_frees_whole_stream() {
        let mut pool = BlockPool::new();
        for idx in 0..4 {
            pool.insert(Block::data(5, idx, 10));
        }
        pool.insert(Block::data(6, 0, 10));

        assert_eq!(pool.release(5), 4);
        assert!(pool.get(5).is_none());
        assert_eq!(pool.count(6), 1);
        assert_eq!(pool.total_blocks(), 1);
    }

    #[test]
    fn release_is_idempotent() {
        let mut pool = BlockPool::new();
        pool.insert(Block::data(9, 0, 10));
        assert_eq!(pool.release(9), 1);
        assert_eq!(pool.release(9), 0);
        assert!(pool.is_empty());
    }

    #[test]
    fn slot_reuse_after_release() {
        let mut pool = BlockPool::new();
        pool.insert(Block::data(1, 0, 10));
        pool.release(1);
        pool.insert(Block::data(2, 0, 10));
        pool.insert(Block::data(2, 1, 10));
        assert_eq!(pool.count(1), 0);
        assert_eq!(pool.count(2), 2);
        assert_eq!(pool.streams(), 1);
    }
}
