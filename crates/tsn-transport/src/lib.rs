//! # tsn-transport
//!
//! Redundancy-based reliable stream delivery between a talker and a switch
//! over lossy, rate-limited paths.
//!
//! A stream is split into `k` fixed-size blocks and protected either by
//! erasure coding (`k` data + `m` parity, any `k` reconstruct) or by
//! duplication (every data block on two paths, all `k` indices needed). The
//! switch acknowledges a stream exactly once, as soon as it becomes
//! reconstructable; the talker then frees its retained copies. Loss is
//! absorbed by redundancy alone: there are no NACKs and no retransmissions.
//!
//! All logic is pure. Time, timers and links are reached through
//! [`context::NodeContext`].
//!
//! ## Crate structure
//!
//! - [`wire`] — Block / Ack messages and their binary encoding
//! - [`context`] — Collaborator interface to the scheduler and channels
//! - [`config`] — Node configuration (role, mode, k, m, stream cap)
//! - [`pool`] — Slab-backed per-stream block arena
//! - [`completion`] — Set of completed streams
//! - [`encoder`] — Redundancy encoder
//! - [`scheduler`] — Transmission pacing against link finish times
//! - [`generator`] — Talker stream lifecycle
//! - [`aggregator`] — Switch reception and completion decision
//! - [`ack`] — Talker acknowledgment handling
//! - [`stats`] — Counters, transit time and run summary
//! - [`node`] — Per-node state and event routing

pub mod ack;
pub mod aggregator;
pub mod completion;
pub mod config;
pub mod context;
pub mod encoder;
pub mod error;
pub mod generator;
pub mod node;
pub mod pool;
pub mod scheduler;
pub mod stats;
pub mod wire;

pub mod test_util;

pub use config::{NodeConfig, RedundancyMode, Role};
pub use context::{NodeContext, PathId, SimTime};
pub use error::{ConfigError, TransportError};
pub use node::{Node, NodeEvent, NodeOutcome};
pub use wire::{Ack, Block, Message, StreamId};
