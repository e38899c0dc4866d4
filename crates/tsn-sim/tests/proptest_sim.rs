//! Property-based checks of whole runs: whatever the seed and bit error
//! rate, the two nodes' counters must agree with each other.

use proptest::prelude::*;
use tsn_sim::{SimConfig, run_simulation};
use tsn_transport::RedundancyMode;

fn mode_strategy() -> impl Strategy<Value = (RedundancyMode, u32, u32)> {
    prop_oneof![
        (1u32..=6, 0u32..=4).prop_map(|(k, m)| (RedundancyMode::Coding, k, m)),
        (1u32..=6).prop_map(|k| (RedundancyMode::Duplication, k, 0)),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn counters_agree_across_nodes(
        (mode, k, m) in mode_strategy(),
        cap in 0u64..40,
        seed in any::<u64>(),
        ber in prop_oneof![Just(0.0), 1e-10f64..1e-8],
    ) {
        let mut cfg = SimConfig::default();
        for node in [&mut cfg.talker, &mut cfg.switch] {
            node.mode = mode;
            node.k = k;
            node.m = m;
        }
        cfg.talker.stream_cap = cap;
        cfg.seed = seed;
        for link in &mut cfg.links {
            link.ber = ber;
        }

        let report = run_simulation(&cfg).unwrap();
        let talker = &report.talker.stats;
        let switch = &report.switch.stats;

        prop_assert!(!report.truncated);
        prop_assert_eq!(talker.streams_originated, cap);
        prop_assert!(talker.streams_delivered <= talker.streams_originated);
        // The return link is clean, so every ack reaches the talker.
        prop_assert_eq!(switch.acks_sent, switch.streams_completed);
        prop_assert_eq!(talker.streams_delivered, switch.streams_completed);
        prop_assert_eq!(talker.duplicate_acks, 0);
        prop_assert_eq!(talker.acks_corrupted, 0);
        prop_assert_eq!(switch.blocks_out_of_range, 0);
        prop_assert_eq!(switch.blocks_received + switch.blocks_corrupted, talker.blocks_sent);
        if ber == 0.0 {
            prop_assert_eq!(talker.streams_delivered, cap);
        }
    }
}
