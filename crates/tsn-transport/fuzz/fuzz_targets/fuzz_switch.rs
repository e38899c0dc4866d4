#![no_main]

use libfuzzer_sys::fuzz_target;
use tsn_transport::test_util::RecordingContext;
use tsn_transport::{Block, Message, Node, NodeConfig, NodeEvent, RedundancyMode};

// Each input byte is one arrival at a k=4, m=4 coding switch:
// bits 0-1 stream, bit 2 parity, bits 3-5 idx (4..8 out of range),
// bit 7 corrupted. No stream may ever be acknowledged twice.
fuzz_target!(|data: &[u8]| {
    let mut node = Node::new("switch", NodeConfig::switch(RedundancyMode::Coding, 4, 4));
    let mut ctx = RecordingContext::new(1);

    for &byte in data {
        let stream_id = u32::from(byte & 0b11);
        let idx = u32::from((byte >> 3) & 0b111);
        let block = if byte & 0b100 != 0 {
            Block::parity(stream_id, idx, 1)
        } else {
            Block::data(stream_id, idx, 1)
        };
        let _ = node.handle(
            NodeEvent::Arrival {
                message: Message::Data(block),
                corrupted: byte & 0x80 != 0,
            },
            &mut ctx,
        );
    }

    let mut acks = [0u32; 4];
    for sent in ctx.sent() {
        if let Message::Ack(ack) = &sent.msg {
            acks[ack.stream_id as usize] += 1;
        }
    }
    assert!(acks.iter().all(|&n| n <= 1));
    let in_range = data
        .iter()
        .filter(|&&b| b & 0x80 == 0 && (b >> 3) & 0b111 < 4)
        .count() as u64;
    assert_eq!(node.stats().blocks_received, in_range);
    assert_eq!(
        acks.iter().sum::<u32>() as usize,
        node.completed().len()
    );
});
