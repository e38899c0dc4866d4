//! tsn-sim
//!
//! Runs one talker/switch simulation and prints the end-of-run report.
//!
//! - Reads an optional TOML run description (`--config`)
//! - Applies command-line overrides on top
//! - Prints a human summary, or JSON with `--json`

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;
use tsn_sim::{SimConfig, run_simulation};
use tsn_transport::RedundancyMode;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Coding,
    Duplication,
}

impl From<ModeArg> for RedundancyMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Coding => RedundancyMode::Coding,
            ModeArg::Duplication => RedundancyMode::Duplication,
        }
    }
}

/// Redundancy-based stream delivery simulator.
#[derive(Parser, Debug)]
#[command(name = "tsn-sim", about = "Simulate redundant stream delivery over lossy links")]
struct Cli {
    /// TOML run description.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Redundancy mode for both nodes.
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Data blocks per stream.
    #[arg(long)]
    k: Option<u32>,

    /// Parity blocks per stream (coding only).
    #[arg(long)]
    m: Option<u32>,

    /// Streams the talker originates before halting.
    #[arg(long)]
    stream_cap: Option<u64>,

    /// Bit error rate applied to every link.
    #[arg(long)]
    ber: Option<f64>,

    /// Seed for bit-error draws.
    #[arg(long)]
    seed: Option<u64>,

    /// Stop after this many simulated seconds.
    #[arg(long)]
    time_limit: Option<f64>,

    /// Print the report as JSON.
    #[arg(long, default_value_t = false)]
    json: bool,
}

impl Cli {
    fn load_config(&self) -> anyhow::Result<SimConfig> {
        let mut cfg = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                SimConfig::from_toml_str(&text)
                    .with_context(|| format!("parsing {}", path.display()))?
            }
            None => SimConfig::default(),
        };

        for node in [&mut cfg.talker, &mut cfg.switch] {
            if let Some(mode) = self.mode {
                node.mode = mode.into();
                if node.mode == RedundancyMode::Duplication && self.m.is_none() {
                    node.m = 0;
                }
            }
            if let Some(k) = self.k {
                node.k = k;
            }
            if let Some(m) = self.m {
                node.m = m;
            }
        }
        if let Some(cap) = self.stream_cap {
            cfg.talker.stream_cap = cap;
        }
        if let Some(ber) = self.ber {
            cfg.set_ber(ber);
        }
        if let Some(seed) = self.seed {
            cfg.seed = seed;
        }
        if let Some(secs) = self.time_limit {
            let limit = Duration::try_from_secs_f64(secs)
                .with_context(|| format!("invalid --time-limit {secs}"))?;
            cfg.time_limit = Some(limit);
        }

        cfg.validate()?;
        Ok(cfg)
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let cli = Cli::parse();
    let cfg = cli.load_config()?;

    tracing::info!(
        mode = %cfg.talker.mode,
        k = cfg.talker.k,
        m = cfg.talker.m,
        stream_cap = cfg.talker.stream_cap,
        paths = cfg.links.len(),
        seed = cfg.seed,
        "tsn-sim starting"
    );

    let report = run_simulation(&cfg)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{report}");
    }
    Ok(())
}
