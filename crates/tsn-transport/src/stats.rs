//! # Node Statistics
//!
//! Running counters for one node, the one-way transit time tracker, and the
//! end-of-run summary. All stats serialize to JSON for the simulator report.

use serde::Serialize;
use std::fmt;
use std::time::Duration;

// ─── Node Stats ─────────────────────────────────────────────────────────────

/// Counters kept by every node. Talker-only and switch-only fields stay zero
/// on the other role.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NodeStats {
    /// Every event handled by the node (arrivals and wake-ups).
    pub messages_received: u64,
    /// Block copies handed to the scheduler.
    pub blocks_sent: u64,
    /// Streams the talker originated.
    pub streams_originated: u64,
    /// Streams whose acknowledgment the talker processed.
    pub streams_delivered: u64,
    /// Acks for streams already delivered.
    pub duplicate_acks: u64,
    /// Acks dropped because the return link flagged a bit error.
    pub acks_corrupted: u64,
    /// Intact blocks that reached the switch.
    pub blocks_received: u64,
    /// Blocks dropped because the channel flagged a bit error.
    pub blocks_corrupted: u64,
    /// Blocks that arrived after their stream completed.
    pub blocks_late: u64,
    /// Blocks whose index does not exist for the configured k and m.
    pub blocks_out_of_range: u64,
    /// Streams the switch judged reconstructable.
    pub streams_completed: u64,
    /// Acks emitted by the switch.
    pub acks_sent: u64,
    /// One-way transit time of intact blocks.
    pub transit: TransitStats,
}

impl NodeStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivered / originated. `None` when nothing was originated.
    pub fn delivery_ratio(&self) -> Option<f64> {
        if self.streams_originated == 0 {
            None
        } else {
            Some(self.streams_delivered as f64 / self.streams_originated as f64)
        }
    }
}

// ─── Transit Time ───────────────────────────────────────────────────────────

/// One-way transit time measured from a block's departure stamp.
#[derive(Debug, Clone, Serialize)]
pub struct TransitStats {
    pub samples: u64,
    pub last_s: f64,
    pub min_s: f64,
    pub max_s: f64,
    pub smoothed_s: f64,
    #[serde(skip)]
    ewma: Ewma,
}

impl Default for TransitStats {
    fn default() -> Self {
        TransitStats {
            samples: 0,
            last_s: 0.0,
            min_s: 0.0,
            max_s: 0.0,
            smoothed_s: 0.0,
            ewma: Ewma::new(0.125),
        }
    }
}

impl TransitStats {
    pub fn record(&mut self, transit: Duration) {
        let secs = transit.as_secs_f64();
        if self.samples == 0 {
            self.min_s = secs;
            self.max_s = secs;
        } else {
            self.min_s = self.min_s.min(secs);
            self.max_s = self.max_s.max(secs);
        }
        self.samples += 1;
        self.last_s = secs;
        self.smoothed_s = self.ewma.update(secs);
    }
}

// ─── EWMA ───────────────────────────────────────────────────────────────────

/// Exponentially weighted moving average.
#[derive(Debug, Clone)]
pub struct Ewma {
    /// Smoothing factor (0.0 - 1.0). Higher = more responsive.
    alpha: f64,
    value: f64,
    initialized: bool,
}

impl Ewma {
    pub fn new(alpha: f64) -> Self {
        assert!((0.0..=1.0).contains(&alpha), "alpha must be in [0, 1]");
        Ewma {
            alpha,
            value: 0.0,
            initialized: false,
        }
    }

    /// Update with a new sample and return the smoothed value.
    pub fn update(&mut self, sample: f64) -> f64 {
        if !self.initialized {
            self.value = sample;
            self.initialized = true;
        } else {
            self.value = self.alpha * sample + (1.0 - self.alpha) * self.value;
        }
        self.value
    }
}

// ─── Run Summary ────────────────────────────────────────────────────────────

/// End-of-run report for a talker.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub streams_originated: u64,
    pub streams_delivered: u64,
    /// `None` when no stream was originated.
    pub delivery_ratio: Option<f64>,
}

impl RunSummary {
    pub fn from_stats(stats: &NodeStats) -> Self {
        RunSummary {
            streams_originated: stats.streams_originated,
            streams_delivered: stats.streams_delivered,
            delivery_ratio: stats.delivery_ratio(),
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "streams originated: {}", self.streams_originated)?;
        writeln!(f, "streams delivered: {}", self.streams_delivered)?;
        match self.delivery_ratio {
            Some(ratio) => write!(f, "delivery ratio: {ratio:.4}"),
            None => write!(f, "delivery ratio: undefined"),
        }
    }
}
