//! Property-based tests for the completion decision.
//!
//! Arbitrary subsets and arrival orders of a stream's blocks are fed to a
//! switch; the number of acks must depend only on how many distinct usable
//! blocks arrived.

use proptest::prelude::*;
use proptest::sample::subsequence;
use tsn_transport::test_util::RecordingContext;
use tsn_transport::{Block, Message, Node, NodeConfig, NodeEvent, RedundancyMode};

fn ack_count(ctx: &RecordingContext) -> usize {
    ctx.sent()
        .iter()
        .filter(|s| matches!(s.msg, Message::Ack(_)))
        .count()
}

fn all_coding_blocks(k: u32, m: u32) -> Vec<Block> {
    (0..k)
        .map(|i| Block::data(0, i, 10))
        .chain((0..m).map(|i| Block::parity(0, i, 10)))
        .collect()
}

fn feed(node: &mut Node, ctx: &mut RecordingContext, blocks: &[Block]) {
    for block in blocks {
        node.handle(
            NodeEvent::Arrival {
                message: Message::Data(block.clone()),
                corrupted: false,
            },
            ctx,
        )
        .unwrap();
    }
}

// ─── Coding Mode ────────────────────────────────────────────────────────────

proptest! {
    /// k=4, m=4: any 4 of the 8 blocks, in any order, yield exactly one ack.
    #[test]
    fn coding_any_k_of_k_plus_m_completes(
        chosen in subsequence(all_coding_blocks(4, 4), 4..=8).prop_shuffle(),
    ) {
        let mut node = Node::new("switch", NodeConfig::switch(RedundancyMode::Coding, 4, 4));
        let mut ctx = RecordingContext::new(1);
        feed(&mut node, &mut ctx, &chosen);
        prop_assert_eq!(ack_count(&ctx), 1);
        prop_assert_eq!(node.held_blocks(), 0);
    }

    /// Fewer than k distinct blocks never complete, however often repeated.
    #[test]
    fn coding_below_k_never_completes(
        chosen in subsequence(all_coding_blocks(4, 4), 0..=3),
        repeats in 1usize..4,
    ) {
        let mut node = Node::new("switch", NodeConfig::switch(RedundancyMode::Coding, 4, 4));
        let mut ctx = RecordingContext::new(1);
        for _ in 0..repeats {
            feed(&mut node, &mut ctx, &chosen);
        }
        prop_assert_eq!(ack_count(&ctx), 0);
        prop_assert_eq!(node.held_blocks(), chosen.len());
    }

    /// The ack fires on exactly the k-th distinct block.
    #[test]
    fn coding_ack_fires_on_kth_distinct_block(
        (k, m, blocks) in (1u32..=8, 0u32..=8).prop_flat_map(|(k, m)| {
            (Just(k), Just(m), Just(all_coding_blocks(k, m)).prop_shuffle())
        }),
    ) {
        let mut node = Node::new("switch", NodeConfig::switch(RedundancyMode::Coding, k, m));
        let mut ctx = RecordingContext::new(1);
        for (i, block) in blocks.iter().enumerate() {
            feed(&mut node, &mut ctx, std::slice::from_ref(block));
            let expected = usize::from(i + 1 >= k as usize);
            prop_assert_eq!(ack_count(&ctx), expected);
        }
    }
}

// ─── Duplication Mode ───────────────────────────────────────────────────────

/// Both copies of every data index, tagged by the path they came in on.
fn duplicated_copies(k: u32) -> Vec<(u32, u8)> {
    (0..k).flat_map(|i| [(i, 0u8), (i, 1u8)]).collect()
}

proptest! {
    /// k=4: any mix of copies covering all four indices yields one ack.
    #[test]
    fn duplication_all_indices_complete(
        path_choice in proptest::collection::vec(0u8..2, 4),
        extra in subsequence(duplicated_copies(4), 0..=8),
    ) {
        let mut copies: Vec<(u32, u8)> = path_choice
            .iter()
            .enumerate()
            .map(|(i, &p)| (i as u32, p))
            .collect();
        copies.extend(extra);

        let mut node = Node::new("switch", NodeConfig::switch(RedundancyMode::Duplication, 4, 0));
        let mut ctx = RecordingContext::new(1);
        let blocks: Vec<Block> = copies.iter().map(|&(idx, _)| Block::data(0, idx, 10)).collect();
        feed(&mut node, &mut ctx, &blocks);
        prop_assert_eq!(ack_count(&ctx), 1);
    }

    /// Only three distinct indices, even with both copies of each, never complete.
    #[test]
    fn duplication_missing_index_never_completes(
        missing in 0u32..4,
        copies in subsequence(duplicated_copies(4), 0..=8).prop_shuffle(),
    ) {
        let mut node = Node::new("switch", NodeConfig::switch(RedundancyMode::Duplication, 4, 0));
        let mut ctx = RecordingContext::new(1);
        let blocks: Vec<Block> = copies
            .iter()
            .filter(|&&(idx, _)| idx != missing)
            .map(|&(idx, _)| Block::data(0, idx, 10))
            .collect();
        feed(&mut node, &mut ctx, &blocks);
        prop_assert_eq!(ack_count(&ctx), 0);
    }
}
