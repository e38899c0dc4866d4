//! # Node Configuration
//!
//! TOML-facing input structs (every field optional) resolved into validated
//! runtime configuration. `(k, m, mode)` applies uniformly to every stream of
//! a run.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::wire::DEFAULT_BLOCK_SIZE;

pub const CONFIG_VERSION: u32 = 1;

/// Default cap on originated streams before the talker halts.
pub const DEFAULT_STREAM_CAP: u64 = 10_000;

// ─── Enums ───────────────────────────────────────────────────────────────────

/// What a node does in the run. Talkers originate streams and consume acks;
/// switches aggregate blocks and emit acks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Talker,
    Switch,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Talker => f.write_str("talker"),
            Role::Switch => f.write_str("switch"),
        }
    }
}

/// Redundancy strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedundancyMode {
    /// k data + m parity blocks; any k of the k+m reconstruct the stream.
    #[default]
    Coding,
    /// k data blocks, each sent on two paths; all k distinct indices needed.
    Duplication,
}

impl fmt::Display for RedundancyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RedundancyMode::Coding => f.write_str("coding"),
            RedundancyMode::Duplication => f.write_str("duplication"),
        }
    }
}

// ─── Input (deserialized) ────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NodeConfigInput {
    pub version: u32,
    pub role: Option<Role>,
    pub mode: Option<RedundancyMode>,
    pub k: Option<u32>,
    pub m: Option<u32>,
    pub stream_cap: Option<u64>,
    pub block_size: Option<u64>,
}

// ─── Resolved ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeConfig {
    pub role: Role,
    pub mode: RedundancyMode,
    /// Data blocks per stream.
    pub k: u32,
    /// Parity blocks per stream (coding mode only, 0 otherwise).
    pub m: u32,
    /// Streams originated before the talker halts for good.
    pub stream_cap: u64,
    pub block_size: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        NodeConfig {
            role: Role::Talker,
            mode: RedundancyMode::Coding,
            k: 4,
            m: 4,
            stream_cap: DEFAULT_STREAM_CAP,
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}

impl NodeConfig {
    pub fn talker(mode: RedundancyMode, k: u32, m: u32) -> Self {
        NodeConfig {
            role: Role::Talker,
            mode,
            k,
            m,
            ..Default::default()
        }
    }

    pub fn switch(mode: RedundancyMode, k: u32, m: u32) -> Self {
        NodeConfig {
            role: Role::Switch,
            ..NodeConfig::talker(mode, k, m)
        }
    }

    pub fn with_stream_cap(mut self, cap: u64) -> Self {
        self.stream_cap = cap;
        self
    }

    pub fn with_block_size(mut self, size: u64) -> Self {
        self.block_size = size;
        self
    }

    /// Check the invariants the protocol relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.k == 0 {
            return Err(ConfigError::InvalidK);
        }
        if self.mode == RedundancyMode::Duplication && self.m != 0 {
            return Err(ConfigError::ParityInDuplication(self.m));
        }
        if self.block_size == 0 {
            return Err(ConfigError::InvalidBlockSize);
        }
        Ok(())
    }

    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        if input.trim().is_empty() {
            return Ok(NodeConfig::default());
        }
        let parsed: NodeConfigInput = toml::from_str(input)?;
        parsed.resolve()
    }
}

impl NodeConfigInput {
    pub fn resolve(self) -> Result<NodeConfig, ConfigError> {
        let version = if self.version == 0 {
            CONFIG_VERSION
        } else {
            self.version
        };
        if version != CONFIG_VERSION {
            return Err(ConfigError::UnsupportedVersion(version));
        }

        let defaults = NodeConfig::default();
        let mode = self.mode.unwrap_or(defaults.mode);
        // Duplication has no parity; an unset m must not inherit the coding default.
        let default_m = match mode {
            RedundancyMode::Coding => defaults.m,
            RedundancyMode::Duplication => 0,
        };

        let cfg = NodeConfig {
            role: self.role.unwrap_or(defaults.role),
            mode,
            k: self.k.unwrap_or(defaults.k),
            m: self.m.unwrap_or(default_m),
            stream_cap: self.stream_cap.unwrap_or(defaults.stream_cap),
            block_size: self.block_size.unwrap_or(defaults.block_size),
        };
        cfg.validate()?;
        Ok(cfg)
    }
}
