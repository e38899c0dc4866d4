//! # tsn-sim
//!
//! Deterministic discrete-event simulation of a talker and a switch running
//! the tsn-transport protocol over datarate channels with bit errors.
//!
//! - [`config`] — TOML run description
//! - [`channel`] — Datarate channel with propagation delay and BER
//! - [`topology`] — Nodes and the channels between them
//! - [`engine`] — Event queue and run loop
//! - [`report`] — End-of-run report

pub mod channel;
pub mod config;
pub mod engine;
pub mod error;
pub mod report;
pub mod topology;

pub use config::SimConfig;
pub use engine::Simulation;
pub use error::SimError;
pub use report::SimReport;
pub use topology::NodeId;

/// Build a simulation from `cfg` and run it to the end.
pub fn run_simulation(cfg: &SimConfig) -> Result<SimReport, SimError> {
    Simulation::new(cfg)?.run()
}
