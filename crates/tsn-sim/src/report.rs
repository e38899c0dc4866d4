//! End-of-run report, printable for humans or serializable as JSON.

use std::fmt;

use serde::Serialize;
use tsn_transport::stats::{NodeStats, RunSummary};

use crate::channel::ChannelStats;

#[derive(Debug, Clone, Serialize)]
pub struct NodeReport {
    /// Running summary line, `rcvd: <n> sent: <n>`.
    pub display: String,
    pub stats: NodeStats,
    /// Only talkers produce a run summary.
    pub summary: Option<RunSummary>,
    /// One entry per egress path.
    pub channels: Vec<ChannelStats>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimReport {
    pub seed: u64,
    /// Simulated time at which the run ended.
    pub end_time_s: f64,
    pub events: u64,
    /// The time limit cut the run short with events still pending.
    pub truncated: bool,
    pub talker: NodeReport,
    pub switch: NodeReport,
}

impl SimReport {
    pub fn delivery_ratio(&self) -> Option<f64> {
        self.talker.summary.as_ref().and_then(|s| s.delivery_ratio)
    }
}

impl fmt::Display for SimReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "simulated {:.6} s, {} events{}",
            self.end_time_s,
            self.events,
            if self.truncated { " (time limit)" } else { "" }
        )?;
        writeln!(f, "talker: {}", self.talker.display)?;
        writeln!(f, "switch: {}", self.switch.display)?;
        writeln!(
            f,
            "switch blocks: {} received, {} corrupted, {} late, {} out of range",
            self.switch.stats.blocks_received,
            self.switch.stats.blocks_corrupted,
            self.switch.stats.blocks_late,
            self.switch.stats.blocks_out_of_range
        )?;
        writeln!(
            f,
            "talker acks: {} duplicate, {} corrupted",
            self.talker.stats.duplicate_acks, self.talker.stats.acks_corrupted
        )?;
        if let Some(summary) = &self.talker.summary {
            write!(f, "{summary}")?;
        }
        Ok(())
    }
}
