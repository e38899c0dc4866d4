//! Hot-path benchmarks for tsn-transport.
//!
//! Measures the per-event cost of:
//! - Switch arrival handling through stream completion (coding and duplication)
//! - Talker wake-up (encode k+m blocks, retain copies, pace onto paths)
//! - Message encode/decode
//!
//! Run with: cargo bench --package tsn-transport

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};

use tsn_transport::test_util::RecordingContext;
use tsn_transport::{Ack, Block, Message, Node, NodeConfig, NodeEvent, RedundancyMode};

fn arrival(block: Block) -> NodeEvent {
    NodeEvent::Arrival {
        message: Message::Data(block),
        corrupted: false,
    }
}

// ─── Switch ─────────────────────────────────────────────────────────────────

fn bench_switch_arrival(c: &mut Criterion) {
    let mut group = c.benchmark_group("switch_stream");
    group.throughput(Throughput::Elements(8));

    group.bench_function("coding_4_4", |b| {
        let mut node = Node::new("switch", NodeConfig::switch(RedundancyMode::Coding, 4, 4));
        let mut ctx = RecordingContext::new(1);
        let mut stream_id = 0u32;
        b.iter(|| {
            for idx in 0..4 {
                let _ = node.handle(arrival(Block::data(stream_id, idx, 1)), &mut ctx);
                let _ = node.handle(arrival(Block::parity(stream_id, idx, 1)), &mut ctx);
            }
            stream_id = stream_id.wrapping_add(1);
            black_box(ctx.take_sent());
        });
    });

    group.bench_function("duplication_4", |b| {
        let mut node = Node::new(
            "switch",
            NodeConfig::switch(RedundancyMode::Duplication, 4, 0),
        );
        let mut ctx = RecordingContext::new(1);
        let mut stream_id = 0u32;
        b.iter(|| {
            for idx in 0..4 {
                for _ in 0..2 {
                    let _ = node.handle(arrival(Block::data(stream_id, idx, 1)), &mut ctx);
                }
            }
            stream_id = stream_id.wrapping_add(1);
            black_box(ctx.take_sent());
        });
    });

    group.finish();
}

// ─── Talker ─────────────────────────────────────────────────────────────────

fn bench_talker_wake(c: &mut Criterion) {
    let mut group = c.benchmark_group("talker_wake");
    group.throughput(Throughput::Elements(1));

    for (mode, k, m) in [
        (RedundancyMode::Coding, 4, 4),
        (RedundancyMode::Duplication, 4, 0),
    ] {
        group.bench_function(format!("{mode}_{k}_{m}"), |b| {
            let cfg = NodeConfig::talker(mode, k, m).with_stream_cap(u64::MAX);
            let mut node = Node::new("talker", cfg);
            let mut ctx = RecordingContext::new(2);
            b.iter(|| {
                let _ = node.handle(NodeEvent::Wake, &mut ctx);
                let sent = ctx.take_sent();
                ctx.take_timers();
                // Ack right away so the send pool stays bounded.
                if let Some(first) = sent.first() {
                    let ack = Ack {
                        stream_id: first.msg.stream_id(),
                    };
                    let _ = node.handle(
                        NodeEvent::Arrival {
                            message: Message::Ack(ack),
                            corrupted: false,
                        },
                        &mut ctx,
                    );
                }
                black_box(sent);
            });
        });
    }

    group.finish();
}

// ─── Wire ───────────────────────────────────────────────────────────────────

fn bench_message_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("message_codec");

    let data = Message::Data(Block::parity(42, 3, 12_800_000));
    let encoded = data.encode();

    group.bench_function("encode_data", |b| {
        b.iter(|| black_box(black_box(&data).encode()));
    });

    group.bench_function("decode_data", |b| {
        b.iter(|| black_box(Message::decode(&mut &encoded[..])));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_switch_arrival,
    bench_talker_wake,
    bench_message_codec
);
criterion_main!(benches);
