use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::anomaly::AnomalyLog;
use crate::config::SettlementConfig;
use crate::history::{HandHistory, ParseError, parse};
use crate::replay::{Replay, ReplayError, build};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Replay(#[from] ReplayError),
}

impl PipelineError {
    /// Stable machine readable code of the underlying failure.
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::Parse(e) => e.code(),
            PipelineError::Replay(e) => e.code(),
        }
    }
}

/// A hand that parsed, replayed and settled cleanly.
#[derive(Debug, Clone)]
pub struct ProcessedHand {
    pub history: HandHistory,
    pub replay: Replay,
}

/// Parse one hand history and build its replay.
///
/// ```
/// use rs_poker_replay::SettlementConfig;
/// use rs_poker_replay::anomaly::NullAnomalyLog;
/// use rs_poker_replay::pipeline::process_hand;
///
/// let text = "\
/// Hand #7 - Holdem (No Limit) - $0.01/$0.02 - 2023/01/01 10:00:00 UTC
/// Table 'Oslo' 6-max Seat #1 is the button
/// Seat 1: Ann ($1.00)
/// Seat 2: Bob ($1.00)
/// Ann posts the small blind $0.01
/// Bob posts the big blind $0.02
/// *** HOLE CARDS ***
/// Ann folds
/// Uncalled bet ($0.01) returned to Bob
/// Bob collected $0.02 from main pot
/// *** SUMMARY ***
/// Total pot $0.02 | Rake $0.00
/// ";
/// let hand = process_hand(text, &SettlementConfig::default(), &NullAnomalyLog).unwrap();
/// let payouts = hand.replay.payouts().unwrap();
/// assert_eq!(Some(&2), payouts.get(&hand.history.players[1].key));
/// ```
#[instrument(level = "debug", skip_all)]
pub fn process_hand(
    text: &str,
    config: &SettlementConfig,
    log: &dyn AnomalyLog,
) -> Result<ProcessedHand, PipelineError> {
    let history = parse(text).inspect_err(|e| warn!(code = e.code(), error = %e, "Parse failed"))?;
    for w in &history.warnings {
        warn!(hand_id = %history.hand_id, warning = %w, "Hand history warning");
    }
    let replay = build(&history, config, log)
        .inspect_err(|e| warn!(hand_id = %history.hand_id, code = e.code(), error = %e, "Replay failed"))?;
    info!(
        hand_id = %history.hand_id,
        site = %history.site,
        snapshots = replay.len(),
        "Processed hand"
    );
    Ok(ProcessedHand { history, replay })
}
