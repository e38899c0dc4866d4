//! # Datarate Channel
//!
//! Point-to-point link with a finite transmission rate, a fixed propagation
//! delay and independent bit errors.
//!
//! A message of `n` bytes whose transmission starts at `t` occupies the
//! channel until `t + n * 8 / datarate` and reaches the far end at that
//! finish time plus the propagation delay. A datarate of 0 means infinite
//! bandwidth: the message occupies the channel for no time at all.

use std::time::Duration;

use rand::RngExt as _;
use rand::rngs::StdRng;
use serde::Serialize;

use crate::config::LinkConfig;

/// Result of starting one transmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transmission {
    /// When the channel becomes idle again.
    pub finish: Duration,
    /// When the last bit reaches the receiver.
    pub arrival: Duration,
    /// At least one bit was flipped on the way.
    pub corrupted: bool,
}

/// The channel was still transmitting when a new transmission was due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Busy {
    pub busy_until: Duration,
}

/// Per-channel counters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChannelStats {
    pub messages: u64,
    pub bytes: u64,
    pub corrupted: u64,
}

#[derive(Debug, Clone)]
pub struct DatarateChannel {
    datarate_bps: u64,
    delay: Duration,
    ber: f64,
    finish: Duration,
    stats: ChannelStats,
}

impl DatarateChannel {
    pub fn new(datarate_bps: u64, delay: Duration, ber: f64) -> Self {
        DatarateChannel {
            datarate_bps,
            delay,
            ber: ber.clamp(0.0, 1.0),
            finish: Duration::ZERO,
            stats: ChannelStats::default(),
        }
    }

    pub fn from_config(cfg: &LinkConfig) -> Self {
        DatarateChannel::new(cfg.datarate_bps, cfg.delay(), cfg.ber)
    }

    pub fn datarate_bps(&self) -> u64 {
        self.datarate_bps
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn ber(&self) -> f64 {
        self.ber
    }

    /// End of the transmission currently on the wire (or the last one).
    pub fn finish_time(&self) -> Duration {
        self.finish
    }

    pub fn stats(&self) -> &ChannelStats {
        &self.stats
    }

    /// Serialization time of `bytes` at this channel's rate.
    pub fn transmission_time(&self, bytes: u64) -> Duration {
        if self.datarate_bps == 0 {
            return Duration::ZERO;
        }
        let bits = u128::from(bytes) * 8;
        let nanos = bits * 1_000_000_000 / u128::from(self.datarate_bps);
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }

    /// Probability that a message of `bytes` arrives with at least one
    /// flipped bit.
    pub fn error_probability(&self, bytes: u64) -> f64 {
        if self.ber <= 0.0 {
            return 0.0;
        }
        let bits = bytes.saturating_mul(8) as f64;
        1.0 - (1.0 - self.ber).powf(bits)
    }

    /// Put `bytes` on the wire starting at `start`.
    pub fn transmit(
        &mut self,
        start: Duration,
        bytes: u64,
        rng: &mut StdRng,
    ) -> Result<Transmission, Busy> {
        if start < self.finish {
            return Err(Busy {
                busy_until: self.finish,
            });
        }

        let finish = start + self.transmission_time(bytes);
        let p = self.error_probability(bytes);
        // Channels without errors never touch the generator, so adding a
        // clean link does not perturb the draws of the lossy ones.
        let corrupted = p > 0.0 && rng.random::<f64>() < p;

        self.finish = finish;
        self.stats.messages += 1;
        self.stats.bytes += bytes;
        if corrupted {
            self.stats.corrupted += 1;
        }

        Ok(Transmission {
            finish,
            arrival: finish + self.delay,
            corrupted,
        })
    }
}
