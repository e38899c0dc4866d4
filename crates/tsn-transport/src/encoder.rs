//! # Redundancy Encoder
//!
//! Splits a stream into the blocks the configured mode transmits and
//! decides which egress paths each block leaves on:
//!
//! | mode        | blocks                         | paths                  |
//! |-------------|--------------------------------|------------------------|
//! | coding      | k data + m parity              | data → 0, parity → 1   |
//! | duplication | k data                         | every data → 0 and 1   |
//!
//! Only the admission side of erasure coding is modeled: parity blocks carry
//! no computed content.

use crate::config::{NodeConfig, RedundancyMode};
use crate::context::PathId;
use crate::pool::BlockPool;
use crate::wire::{Block, StreamId};

const DATA_PATHS: &[PathId] = &[PathId(0)];
const PARITY_PATHS: &[PathId] = &[PathId(1)];
const DUPLICATE_PATHS: &[PathId] = &[PathId(0), PathId(1)];

/// A block together with the egress paths it must be sent on.
#[derive(Debug, Clone)]
pub struct EncodedBlock {
    pub block: Block,
    pub paths: &'static [PathId],
}

#[derive(Debug, Clone)]
pub struct RedundancyEncoder {
    mode: RedundancyMode,
    k: u32,
    m: u32,
    block_size: u64,
}

impl RedundancyEncoder {
    pub fn new(config: &NodeConfig) -> Self {
        RedundancyEncoder {
            mode: config.mode,
            k: config.k,
            m: config.m,
            block_size: config.block_size,
        }
    }

    pub fn mode(&self) -> RedundancyMode {
        self.mode
    }

    /// Number of egress paths the mode sends on.
    pub fn required_paths(&self) -> usize {
        match self.mode {
            RedundancyMode::Coding if self.m == 0 => 1,
            RedundancyMode::Coding => 2,
            RedundancyMode::Duplication => 2,
        }
    }

    /// Copies put on the wire per stream.
    pub fn copies_per_stream(&self) -> u64 {
        match self.mode {
            RedundancyMode::Coding => (self.k + self.m) as u64,
            RedundancyMode::Duplication => 2 * self.k as u64,
        }
    }

    /// Produce the blocks of `stream_id`, retaining one copy of each in
    /// `send_pool` until the stream is acknowledged.
    pub fn encode(&self, stream_id: StreamId, send_pool: &mut BlockPool) -> Vec<EncodedBlock> {
        let data_paths = match self.mode {
            RedundancyMode::Coding => DATA_PATHS,
            RedundancyMode::Duplication => DUPLICATE_PATHS,
        };

        let mut out = Vec::with_capacity((self.k + self.m) as usize);
        for idx in 0..self.k {
            out.push(EncodedBlock {
                block: Block::data(stream_id, idx, self.block_size),
                paths: data_paths,
            });
        }
        if self.mode == RedundancyMode::Coding {
            for idx in 0..self.m {
                out.push(EncodedBlock {
                    block: Block::parity(stream_id, idx, self.block_size),
                    paths: PARITY_PATHS,
                });
            }
        }

        for encoded in &out {
            send_pool.insert(encoded.block.clone());
        }
        out
    }
}
