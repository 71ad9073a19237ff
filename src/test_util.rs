//! Sample hands and replay invariants shared by the unit tests.
use crate::history::Amount;
use crate::replay::Replay;

pub const STARS_CASH_SHOWDOWN: &str = r"PokerStars Hand #208112233446:  Hold'em No Limit ($0.05/$0.10 USD) - 2020/01/15 20:31:02 ET
Table 'Alcyone III' 6-max Seat #1 is the button
Seat 1: Alice ($10.00 in chips)
Seat 2: Bob ($10.00 in chips)
Seat 3: Carol ($5.00 in chips)
Bob: posts small blind $0.05
Carol: posts big blind $0.10
*** HOLE CARDS ***
Dealt to Alice [Ah Kh]
Alice: raises $0.20 to $0.30
Bob: folds
Carol: calls $0.20
*** FLOP *** [Kd 7c 2s]
Carol: checks
Alice: bets $0.40
Carol: calls $0.40
*** TURN *** [Kd 7c 2s] [9h]
Carol: checks
Alice: checks
*** RIVER *** [Kd 7c 2s 9h] [3d]
Carol: checks
Alice: checks
*** SHOW DOWN ***
Carol: shows [Qs Qd] (a pair of Queens)
Alice: shows [Ah Kh] (a pair of Kings)
Alice collected $1.42 from pot
*** SUMMARY ***
Total pot $1.45 | Rake $0.03
Board [Kd 7c 2s 9h 3d]
Seat 1: Alice (button) showed [Ah Kh] and won ($1.42) with a pair of Kings
Seat 2: Bob (small blind) folded before Flop
Seat 3: Carol (big blind) showed [Qs Qd] and lost with a pair of Queens
";

pub const GG_TOURNAMENT_SIDE_POT: &str = r"Poker Hand #TM1234567: Tournament #98765, Bounty Hunters $10 Hold'em No Limit - Level5(100/200(25)) - 2023/01/01 12:00:00
Table '12' 8-max Seat #1 is the button
Seat 1: Hero (5,000 in chips)
Seat 2: Villain1 (1,000 in chips)
Seat 3: Villain2 (3,000 in chips)
Hero: posts the ante 25
Villain1: posts the ante 25
Villain2: posts the ante 25
Villain1: posts small blind 100
Villain2: posts big blind 200
*** HOLE CARDS ***
Dealt to Hero [As Ad]
Dealt to Villain1
Dealt to Villain2
Hero: raises 1,000 to 1,200
Villain1: calls 875 and is all-in
Villain2: calls 1,000
*** FLOP *** [Kd 7c 2s]
Villain2: bets 1,775 and is all-in
Hero: calls 1,775
*** TURN *** [Kd 7c 2s] [9h]
*** RIVER *** [Kd 7c 2s 9h] [3d]
*** SHOWDOWN ***
Villain1: shows [Kh Qh] (a pair of Kings)
Villain2: shows [Jc Jd] (a pair of Jacks)
Hero: shows [As Ad] (a pair of Aces)
Hero collected 4,000 from side pot
Hero collected 3,000 from main pot
*** SUMMARY ***
Total pot 7,000 | Rake 0 | Jackpot 0 | Bingo 0 | Fortune 0 | Tax 0
Board [Kd 7c 2s 9h 3d]
";

pub const ACR_CASH_UNCALLED: &str = r"Hand #2000001 - Holdem (No Limit) - $0.01/$0.02 - 2023/01/01 10:00:00 UTC
Table 'Aberdeen' 6-max Seat #2 is the button
Seat 1: Big Bob ($2.00)
Seat 2: Ann ($1.50)
Seat 4: Cid ($3.10)
Cid posts the small blind $0.01
Big Bob posts the big blind $0.02
*** HOLE CARDS ***
Dealt to Ann [7h 7d]
Ann raises $0.04 to $0.06
Cid folds
Big Bob calls $0.04
*** FLOP *** [Ts 8c 2h]
Big Bob checks
Ann bets $0.10
Big Bob folds
Uncalled bet ($0.10) returned to Ann
Ann collected $0.13 from main pot
*** SUMMARY ***
Total pot $0.13 | Rake $0.00
Board [Ts 8c 2h]
Seat 1: Big Bob (big blind) folded on the Flop
Seat 2: Ann (button) won $0.13
Seat 4: Cid (small blind) folded before Flop
";

pub const STARS_TOURNAMENT_SPLIT: &str = r"PokerStars Hand #208112233445: Tournament #3012345678, $0.98+$0.12 USD Hold'em No Limit - Level IV (50/100) - 2020/01/15 20:31:02 ET
Table '3012345678 1' 9-max Seat #1 is the button
Seat 1: Alice (1500 in chips)
Seat 2: Bob (1500 in chips)
Alice: posts small blind 50
Bob: posts big blind 100
*** HOLE CARDS ***
Alice: raises 1400 to 1500 and is all-in
Bob: calls 1400 and is all-in
*** FLOP *** [Ah Kh Qh]
*** TURN *** [Ah Kh Qh] [Jh]
*** RIVER *** [Ah Kh Qh Jh] [Th]
*** SHOW DOWN ***
Alice: shows [2c 3d] (a straight flush, Ten to Ace)
Bob: shows [4s 5s] (a straight flush, Ten to Ace)
Alice collected 1500 from pot
Bob collected 1500 from pot
*** SUMMARY ***
Total pot 3000 | Rake 0
Board [Ah Kh Qh Jh Th]
Seat 1: Alice (button) (small blind) showed [2c 3d] and won (1500) with a Royal Flush
Seat 2: Bob (big blind) showed [4s 5s] and won (1500) with a Royal Flush
";

pub const STARS_CASH_DEAD_BLIND: &str = r"PokerStars Hand #208112233447:  Hold'em No Limit ($0.05/$0.10 USD) - 2020/01/15 20:35:00 ET
Table 'Alcyone III' 6-max Seat #1 is the button
Seat 1: Alice ($10.00 in chips)
Seat 2: Bob ($10.00 in chips)
Seat 3: Carol ($5.00 in chips)
Seat 4: Ann ($4.00 in chips)
Bob: posts small blind $0.05
Carol: posts big blind $0.10
Ann: posts small & big blinds $0.15
*** HOLE CARDS ***
Ann: checks
Alice: folds
Bob: folds
Carol: checks
*** FLOP *** [Kd 7c 2s]
Carol: bets $0.20
Ann: folds
Uncalled bet ($0.20) returned to Carol
Carol collected $0.30 from pot
*** SUMMARY ***
Total pot $0.30 | Rake $0.00
Board [Kd 7c 2s]
";

/// Big covers everyone and gets the uncovered part of the shove back.
pub const STARS_TOURNAMENT_UNCALLED_ALL_IN: &str = r"PokerStars Hand #208112233450: Tournament #3012345679, $0.98+$0.12 USD Hold'em No Limit - Level II (50/100) - 2020/01/15 21:00:00 ET
Table '3012345679 1' 9-max Seat #1 is the button
Seat 1: Big (5000 in chips)
Seat 2: Short (800 in chips)
Seat 3: Mid (1500 in chips)
Short: posts small blind 50
Mid: posts big blind 100
*** HOLE CARDS ***
Big: raises 4900 to 5000 and is all-in
Short: calls 750 and is all-in
Mid: calls 1400 and is all-in
Uncalled bet (3500) returned to Big
*** FLOP *** [2c 7d 9h]
*** TURN *** [2c 7d 9h] [Jc]
*** RIVER *** [2c 7d 9h Jc] [4s]
*** SHOW DOWN ***
Big: shows [Kc Qd] (high card King)
Short: shows [As Ad] (a pair of Aces)
Mid: shows [Ks Kd] (a pair of Kings)
Mid collected 1400 from side pot
Short collected 2400 from main pot
*** SUMMARY ***
Total pot 3800 | Rake 0
Board [2c 7d 9h Jc 4s]
";

/// Two all-ins and a caller with chips behind, raked across both pots.
pub const STARS_CASH_RAKED_SIDE_POT: &str = r"PokerStars Hand #208112233451:  Hold'em No Limit ($0.05/$0.10 USD) - 2020/01/15 21:10:00 ET
Table 'Alcyone IV' 6-max Seat #1 is the button
Seat 1: Dana ($20.00 in chips)
Seat 2: Eve ($10.00 in chips)
Seat 3: Finn ($15.00 in chips)
Eve: posts small blind $0.05
Finn: posts big blind $0.10
*** HOLE CARDS ***
Dana: raises $0.20 to $0.30
Eve: raises $9.70 to $10.00 and is all-in
Finn: raises $5.00 to $15.00 and is all-in
Dana: calls $14.70
*** FLOP *** [2c 7d 9h]
*** TURN *** [2c 7d 9h] [Jc]
*** RIVER *** [2c 7d 9h Jc] [4s]
*** SHOW DOWN ***
Eve: shows [As Ad] (a pair of Aces)
Finn: shows [Ks Kd] (a pair of Kings)
Dana: shows [Qs Qd] (a pair of Queens)
Finn collected $9.91 from side pot
Eve collected $29.74 from main pot
*** SUMMARY ***
Total pot $40.00 | Rake $0.35
Board [2c 7d 9h Jc 4s]
";

/// Check the invariants every successfully built replay must hold.
pub fn assert_valid_replay(replay: &Replay) {
    assert!(!replay.is_empty());
    let terminal = replay
        .terminal()
        .expect("A built replay should end in a showdown snapshot");

    for (i, snap) in replay.iter().enumerate() {
        assert_eq!(i, snap.sequence);
        assert!(
            snap.stacks.values().all(|s| *s >= 0),
            "Negative stack at snapshot {i}: {:?}",
            snap.stacks
        );

        // Pots only narrow as the level goes up.
        for pair in snap.pots.windows(2) {
            assert!(pair[0].level < pair[1].level, "Pot levels out of order at {i}");
            assert!(pair[1].eligible.is_subset(&pair[0].eligible));
        }

        if i + 1 < replay.len() {
            assert_eq!(0, snap.rake_applied, "Rake taken early at snapshot {i}");
            assert!(snap.showdown.is_none());
        }
    }

    // Nobody unfolds.
    for pair in replay.snapshots().windows(2) {
        assert!(pair[0].folded.is_subset(&pair[1].folded));
    }

    let committed: Amount = terminal.committed.values().sum();
    let payout = terminal.showdown.as_ref().unwrap();
    let paid: Amount = payout.payouts.values().sum();
    assert_eq!(committed - terminal.rake_applied, paid);
    assert_eq!(paid, terminal.pot_total());

    let start: Amount = replay.snapshots()[0]
        .stacks
        .values()
        .chain(replay.snapshots()[0].committed.values())
        .sum();
    let end: Amount = payout.final_stacks.values().sum();
    assert_eq!(start, end + terminal.rake_applied);
}
