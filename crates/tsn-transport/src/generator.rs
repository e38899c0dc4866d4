//! # Stream Generator
//!
//! Talker-side lifecycle. Each wake-up originates one stream: encode it,
//! dispatch every copy on its paths, then sleep until the busiest egress
//! path has drained. At most one stream is in flight across the whole gate.
//!
//! ```text
//!  Idle ──first wake──▶ Generating ──dispatched──▶ WaitingForDrain
//!                           ▲   │                         │
//!                           │   └── cap reached ──▶ Halted (terminal)
//!                           └──────────── wake ───────────┘
//! ```
//!
//! `Idle` is only the state before the first wake-up; nothing transitions
//! back into it. With a zero cap the first wake-up goes straight to `Halted`.

use tracing::{debug, info};

use crate::context::{NodeContext, SimTime};
use crate::encoder::RedundancyEncoder;
use crate::error::TransportError;
use crate::pool::BlockPool;
use crate::scheduler::TransmissionScheduler;
use crate::stats::NodeStats;
use crate::wire::StreamId;

/// Generator lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorState {
    /// Before the first wake-up, whether or not it is armed yet. Never
    /// re-entered.
    Idle,
    /// Inside a wake-up, dispatching the current stream.
    Generating,
    /// Stream dispatched; next wake-up at `until`.
    WaitingForDrain { until: SimTime },
    /// Stream cap reached. No timer is armed and none ever will be.
    Halted,
}

/// Result of one wake-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WakeOutcome {
    Originated {
        stream_id: StreamId,
        copies: u64,
        next_wake: SimTime,
    },
    Halted,
}

pub struct StreamGenerator {
    encoder: RedundancyEncoder,
    scheduler: TransmissionScheduler,
    next_stream_id: StreamId,
    originated: u64,
    stream_cap: u64,
    state: GeneratorState,
}

impl StreamGenerator {
    pub fn new(encoder: RedundancyEncoder, stream_cap: u64) -> Self {
        StreamGenerator {
            encoder,
            scheduler: TransmissionScheduler::new(),
            next_stream_id: 0,
            originated: 0,
            stream_cap,
            state: GeneratorState::Idle,
        }
    }

    pub fn state(&self) -> GeneratorState {
        self.state
    }

    pub fn next_stream_id(&self) -> StreamId {
        self.next_stream_id
    }

    pub fn originated(&self) -> u64 {
        self.originated
    }

    /// Arm the first wake-up at the current time.
    pub fn start(&mut self, ctx: &mut impl NodeContext) -> Result<(), TransportError> {
        let required = self.encoder.required_paths();
        let available = ctx.path_count();
        if available < required {
            return Err(TransportError::InsufficientPaths {
                required,
                available,
            });
        }
        ctx.schedule_at(ctx.now());
        Ok(())
    }

    /// Handle a self-timer.
    pub fn on_wake(
        &mut self,
        send_pool: &mut BlockPool,
        stats: &mut NodeStats,
        ctx: &mut impl NodeContext,
    ) -> WakeOutcome {
        if self.state == GeneratorState::Halted {
            return WakeOutcome::Halted;
        }
        if self.originated >= self.stream_cap {
            self.state = GeneratorState::Halted;
            info!(
                originated = self.originated,
                cap = self.stream_cap,
                "stream cap reached, generator halted"
            );
            return WakeOutcome::Halted;
        }

        self.state = GeneratorState::Generating;
        self.originated += 1;
        stats.streams_originated += 1;

        let stream_id = self.next_stream_id;
        debug!(stream_id, mode = %self.encoder.mode(), "originating stream");

        let mut copies = 0;
        for encoded in self.encoder.encode(stream_id, send_pool) {
            for &path in encoded.paths {
                self.scheduler.dispatch(encoded.block.clone(), path, ctx);
                copies += 1;
            }
        }
        stats.blocks_sent += copies;

        self.next_stream_id = self.next_stream_id.wrapping_add(1);

        let next_wake = self.scheduler.max_finish_time(&*ctx);
        ctx.schedule_at(next_wake);
        self.state = GeneratorState::WaitingForDrain { until: next_wake };

        WakeOutcome::Originated {
            stream_id,
            copies,
            next_wake,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{NodeConfig, RedundancyMode};
    use crate::context::PathId;
    use crate::test_util::RecordingContext;
    use crate::wire::Message;
    use std::time::Duration;

    const GBPS: u64 = 1_000_000_000;

    fn generator(mode: RedundancyMode, k: u32, m: u32, cap: u64) -> StreamGenerator {
        let cfg = NodeConfig::talker(mode, k, m).with_stream_cap(cap);
        StreamGenerator::new(RedundancyEncoder::new(&cfg), cfg.stream_cap)
    }

    #[test]
    fn start_arms_timer_now() {
        let mut gen = generator(RedundancyMode::Coding, 4, 4, 10);
        let mut ctx = RecordingContext::new(2);
        gen.start(&mut ctx).unwrap();
        assert_eq!(ctx.timers(), &[Duration::ZERO]);
        assert_eq!(gen.state(), GeneratorState::Idle);
    }

    #[test]
    fn idle_is_never_reentered() {
        let mut gen = generator(RedundancyMode::Coding, 2, 1, 3);
        let mut ctx = RecordingContext::new(2).with_datarate(GBPS);
        let mut pool = BlockPool::new();
        let mut stats = NodeStats::new();
        gen.start(&mut ctx).unwrap();

        for _ in 0..4 {
            gen.on_wake(&mut pool, &mut stats, &mut ctx);
            assert_ne!(gen.state(), GeneratorState::Idle);
        }
        assert_eq!(gen.state(), GeneratorState::Halted);
    }

    #[test]
    fn start_rejects_missing_paths() {
        let mut gen = generator(RedundancyMode::Duplication, 4, 0, 10);
        let mut ctx = RecordingContext::new(1);
        let err = gen.start(&mut ctx).unwrap_err();
        assert!(matches!(
            err,
            TransportError::InsufficientPaths {
                required: 2,
                available: 1
            }
        ));
    }

    #[test]
    fn coding_wake_dispatches_all_copies() {
        let mut gen = generator(RedundancyMode::Coding, 4, 4, 10);
        let mut ctx = RecordingContext::new(2).with_datarate(GBPS);
        let mut pool = BlockPool::new();
        let mut stats = NodeStats::new();

        let outcome = gen.on_wake(&mut pool, &mut stats, &mut ctx);
        let sent = ctx.take_sent();
        assert_eq!(sent.len(), 8);
        assert_eq!(sent.iter().filter(|s| s.path == PathId(0)).count(), 4);
        assert_eq!(sent.iter().filter(|s| s.path == PathId(1)).count(), 4);
        assert_eq!(stats.blocks_sent, 8);
        assert_eq!(stats.streams_originated, 1);
        assert_eq!(pool.count(0), 8);
        assert_eq!(gen.next_stream_id(), 1);

        // 4 × 12.8 MB back-to-back at 1 Gb/s on each path.
        let drained = Duration::from_nanos(4 * 102_400_000);
        assert_eq!(
            outcome,
            WakeOutcome::Originated {
                stream_id: 0,
                copies: 8,
                next_wake: drained
            }
        );
        assert_eq!(ctx.timers(), &[drained]);
        assert_eq!(gen.state(), GeneratorState::WaitingForDrain { until: drained });
    }

    #[test]
    fn duplication_wake_sends_each_idx_on_both_paths() {
        let mut gen = generator(RedundancyMode::Duplication, 3, 0, 10);
        let mut ctx = RecordingContext::new(2).with_datarate(GBPS);
        let mut pool = BlockPool::new();
        let mut stats = NodeStats::new();

        gen.on_wake(&mut pool, &mut stats, &mut ctx);
        let sent = ctx.take_sent();
        assert_eq!(sent.len(), 6);
        for idx in 0..3 {
            let paths: Vec<PathId> = sent
                .iter()
                .filter(|s| matches!(&s.msg, Message::Data(b) if b.idx == idx))
                .map(|s| s.path)
                .collect();
            assert_eq!(paths, vec![PathId(0), PathId(1)]);
        }
        assert_eq!(pool.count(0), 3);
    }

    #[test]
    fn departures_are_serialized_per_path() {
        let mut gen = generator(RedundancyMode::Coding, 3, 0, 10);
        let mut ctx = RecordingContext::new(1).with_datarate(GBPS);
        let mut pool = BlockPool::new();
        let mut stats = NodeStats::new();

        gen.on_wake(&mut pool, &mut stats, &mut ctx);
        let stamps: Vec<Duration> = ctx
            .sent()
            .iter()
            .map(|s| match &s.msg {
                Message::Data(b) => b.send_time,
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        let tx = Duration::from_nanos(102_400_000);
        assert_eq!(stamps, vec![Duration::ZERO, tx, tx * 2]);
    }

    #[test]
    fn halts_after_cap_without_rearming() {
        let mut gen = generator(RedundancyMode::Coding, 2, 1, 2);
        let mut ctx = RecordingContext::new(2).with_datarate(GBPS);
        let mut pool = BlockPool::new();
        let mut stats = NodeStats::new();

        for _ in 0..2 {
            let next = ctx.timers().last().copied().unwrap_or_default();
            ctx.set_now(next);
            assert!(matches!(
                gen.on_wake(&mut pool, &mut stats, &mut ctx),
                WakeOutcome::Originated { .. }
            ));
        }
        let timers_before = ctx.timers().len();
        let sent_before = ctx.sent().len();

        assert_eq!(
            gen.on_wake(&mut pool, &mut stats, &mut ctx),
            WakeOutcome::Halted
        );
        assert_eq!(gen.state(), GeneratorState::Halted);
        assert_eq!(ctx.timers().len(), timers_before);
        assert_eq!(ctx.sent().len(), sent_before);
        assert_eq!(stats.streams_originated, 2);

        // Stays halted.
        assert_eq!(
            gen.on_wake(&mut pool, &mut stats, &mut ctx),
            WakeOutcome::Halted
        );
        assert_eq!(gen.originated(), 2);
    }

    #[test]
    fn zero_cap_never_originates() {
        let mut gen = generator(RedundancyMode::Coding, 4, 4, 0);
        let mut ctx = RecordingContext::new(2);
        let mut pool = BlockPool::new();
        let mut stats = NodeStats::new();
        assert_eq!(
            gen.on_wake(&mut pool, &mut stats, &mut ctx),
            WakeOutcome::Halted
        );
        assert!(ctx.sent().is_empty());
        assert!(pool.is_empty());
    }
}
