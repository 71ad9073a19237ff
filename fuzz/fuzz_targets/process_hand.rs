#![no_main]

extern crate libfuzzer_sys;
extern crate rs_poker_replay;

use libfuzzer_sys::fuzz_target;
use rs_poker_replay::anomaly::VecAnomalyLog;
use rs_poker_replay::{SettlementConfig, process_hand};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    for fail_fast in [true, false] {
        let config = SettlementConfig::default().with_fail_fast(fail_fast);
        let log = VecAnomalyLog::new();
        let Ok(hand) = process_hand(text, &config, &log) else {
            continue;
        };
        let replay = &hand.replay;
        let terminal = replay.terminal().unwrap();
        let payout = terminal.showdown.as_ref().unwrap();

        let committed: i64 = terminal.committed.values().sum();
        let paid: i64 = payout.payouts.values().sum();
        assert_eq!(committed - terminal.rake_applied, paid);
        assert!(replay.iter().all(|s| s.stacks.values().all(|v| *v >= 0)));
        assert!(replay
            .snapshots()
            .windows(2)
            .all(|w| w[0].folded.is_subset(&w[1].folded)));
    }
});
