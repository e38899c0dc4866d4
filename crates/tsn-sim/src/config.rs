//! # Simulation Configuration
//!
//! One TOML document describes a whole run: the two nodes, the talker's
//! egress links and the return link the switch acknowledges on.
//!
//! ```toml
//! seed = 42
//! time_limit_s = 30.0
//! summary_interval = 1000
//!
//! [talker]
//! mode = "coding"
//! k = 4
//! m = 4
//! stream_cap = 500
//!
//! [[links]]
//! datarate_bps = 1_000_000_000
//! delay_us = 50
//! ber = 1e-9
//!
//! [[links]]
//! datarate_bps = 1_000_000_000
//! delay_us = 50
//! ber = 1e-9
//!
//! [return_link]
//! datarate_bps = 1_000_000_000
//! ```
//!
//! `[switch]` may be omitted; it then inherits mode, k, m and block size from
//! `[talker]`. Setting them differently on the two nodes is rejected.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tsn_transport::config::{NodeConfigInput, CONFIG_VERSION};
use tsn_transport::{ConfigError, NodeConfig, Role};

use crate::error::SimError;

pub const DEFAULT_DATARATE_BPS: u64 = 1_000_000_000;
pub const DEFAULT_PATHS: usize = 2;
pub const DEFAULT_SEED: u64 = 1;

// ─── Input (deserialized) ────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SimConfigInput {
    pub version: u32,
    pub seed: Option<u64>,
    pub time_limit_s: Option<f64>,
    pub summary_interval: Option<u64>,
    pub talker: NodeConfigInput,
    pub switch: NodeConfigInput,
    pub links: Vec<LinkConfigInput>,
    pub return_link: Option<LinkConfigInput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LinkConfigInput {
    pub datarate_bps: Option<u64>,
    pub delay_us: Option<u64>,
    pub ber: Option<f64>,
}

// ─── Resolved ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkConfig {
    /// Bits per second; 0 means infinite.
    pub datarate_bps: u64,
    pub delay_us: u64,
    /// Independent per-bit error probability.
    pub ber: f64,
}

impl Default for LinkConfig {
    fn default() -> Self {
        LinkConfig {
            datarate_bps: DEFAULT_DATARATE_BPS,
            delay_us: 0,
            ber: 0.0,
        }
    }
}

impl LinkConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_micros(self.delay_us)
    }

    fn validate(&self, index: usize) -> Result<(), SimError> {
        if !(0.0..=1.0).contains(&self.ber) {
            return Err(SimError::InvalidLink {
                index,
                reason: format!("ber {} outside [0, 1]", self.ber),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimConfig {
    pub seed: u64,
    pub time_limit: Option<Duration>,
    /// Log the nodes' running summaries every this many handled events
    /// (0 disables).
    pub summary_interval: u64,
    pub talker: NodeConfig,
    pub switch: NodeConfig,
    /// Talker egress paths, in path order.
    pub links: Vec<LinkConfig>,
    /// Switch egress path 0, carrying acks back.
    pub return_link: LinkConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        let talker = NodeConfig::default();
        let switch = NodeConfig {
            role: Role::Switch,
            ..talker.clone()
        };
        SimConfig {
            seed: DEFAULT_SEED,
            time_limit: None,
            summary_interval: 0,
            talker,
            switch,
            links: vec![LinkConfig::default(); DEFAULT_PATHS],
            return_link: LinkConfig::default(),
        }
    }
}

impl SimConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, SimError> {
        if input.trim().is_empty() {
            return Ok(SimConfig::default());
        }
        let parsed: SimConfigInput = toml::from_str(input).map_err(ConfigError::from)?;
        parsed.resolve()
    }

    /// Apply the same bit error rate to every link, return link included.
    pub fn set_ber(&mut self, ber: f64) {
        for link in &mut self.links {
            link.ber = ber;
        }
        self.return_link.ber = ber;
    }

    /// Re-check invariants after command-line overrides.
    pub fn validate(&self) -> Result<(), SimError> {
        self.talker.validate()?;
        self.switch.validate()?;
        for (field, same) in [
            ("mode", self.talker.mode == self.switch.mode),
            ("k", self.talker.k == self.switch.k),
            ("m", self.talker.m == self.switch.m),
        ] {
            if !same {
                return Err(SimError::NodeMismatch { field });
            }
        }
        for (index, link) in self.links.iter().enumerate() {
            link.validate(index)?;
        }
        self.return_link.validate(self.links.len())?;
        Ok(())
    }
}

impl LinkConfigInput {
    fn resolve(self) -> LinkConfig {
        let defaults = LinkConfig::default();
        LinkConfig {
            datarate_bps: self.datarate_bps.unwrap_or(defaults.datarate_bps),
            delay_us: self.delay_us.unwrap_or(defaults.delay_us),
            ber: self.ber.unwrap_or(defaults.ber),
        }
    }
}

impl SimConfigInput {
    pub fn resolve(self) -> Result<SimConfig, SimError> {
        let version = if self.version == 0 {
            CONFIG_VERSION
        } else {
            self.version
        };
        if version != CONFIG_VERSION {
            return Err(ConfigError::UnsupportedVersion(version).into());
        }

        let talker_input = NodeConfigInput {
            role: Some(Role::Talker),
            ..self.talker
        };
        // The switch inherits whatever the talker section pins down.
        let switch_input = NodeConfigInput {
            role: Some(Role::Switch),
            mode: self.switch.mode.or(talker_input.mode),
            k: self.switch.k.or(talker_input.k),
            m: self.switch.m.or(talker_input.m),
            block_size: self.switch.block_size.or(talker_input.block_size),
            ..self.switch
        };

        let links = if self.links.is_empty() {
            vec![LinkConfig::default(); DEFAULT_PATHS]
        } else {
            self.links.into_iter().map(LinkConfigInput::resolve).collect()
        };

        let time_limit = match self.time_limit_s {
            None => None,
            Some(secs) => Some(Duration::try_from_secs_f64(secs).map_err(|_| {
                SimError::InvalidTimeLimit(secs)
            })?),
        };

        let cfg = SimConfig {
            seed: self.seed.unwrap_or(DEFAULT_SEED),
            time_limit,
            summary_interval: self.summary_interval.unwrap_or(0),
            talker: talker_input.resolve()?,
            switch: switch_input.resolve()?,
            links,
            return_link: self.return_link.unwrap_or_default().resolve(),
        };
        cfg.validate()?;
        Ok(cfg)
    }
}
