//! Invariant checks run against every replay state.
//!
//! Each guard is a plain function returning a [`GuardResult`]. The replay
//! builder gathers a batch of them per snapshot and hands the batch to
//! [`enforce`], which aborts on the first critical failure and records
//! everything else in the anomaly log.
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{error, warn};

use crate::anomaly::{AnomalyKind, AnomalyLog, AnomalyLogEntry};
use crate::core::PlayerKey;
use crate::history::Amount;
use crate::settlement::Pot;

/// Slack allowed by the conservation check, in minor units.
pub const CONSERVATION_TOLERANCE: Amount = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardSeverity {
    Warning,
    Error,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardResult {
    pub name: String,
    pub passed: bool,
    pub severity: GuardSeverity,
    pub message: String,
    pub context: Value,
    pub recoverable: bool,
}

impl GuardResult {
    fn check(name: &str, severity: GuardSeverity, failure: Option<(String, Value)>) -> Self {
        let (passed, message, context) = match failure {
            None => (true, "ok".to_string(), Value::Null),
            Some((message, context)) => (false, message, context),
        };
        GuardResult {
            name: name.to_string(),
            passed,
            severity,
            message,
            context,
            recoverable: severity != GuardSeverity::Critical,
        }
    }

    pub fn is_critical_failure(&self) -> bool {
        !self.passed && self.severity == GuardSeverity::Critical
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GuardError {
    #[error("guard {guard} failed at snapshot {sequence}: {message}")]
    Critical {
        guard: String,
        sequence: usize,
        message: String,
        context: Value,
    },
}

/// Chips in play never change except for rake.
pub fn money_conservation(
    initial_total: Amount,
    stacks_total: Amount,
    pot_total: Amount,
    rake: Amount,
) -> GuardResult {
    let accounted = stacks_total + pot_total + rake;
    let diff = (initial_total - accounted).abs();
    let failure = (diff > CONSERVATION_TOLERANCE).then(|| {
        (
            format!("started with {initial_total}, now {accounted} accounted for"),
            json!({
                "initial_total": initial_total,
                "stacks_total": stacks_total,
                "pot_total": pot_total,
                "rake": rake,
            }),
        )
    });
    GuardResult::check("money_conservation", GuardSeverity::Critical, failure)
}

/// `final = initial - committed + payout` for every player.
pub fn stack_consistency(
    starting: &BTreeMap<PlayerKey, Amount>,
    committed: &BTreeMap<PlayerKey, Amount>,
    payouts: &BTreeMap<PlayerKey, Amount>,
    final_stacks: &BTreeMap<PlayerKey, Amount>,
) -> GuardResult {
    let mismatched: BTreeMap<&PlayerKey, Value> = starting
        .iter()
        .filter_map(|(player, start)| {
            let spent = committed.get(player).copied().unwrap_or(0);
            let won = payouts.get(player).copied().unwrap_or(0);
            let expected = start - spent + won;
            let actual = final_stacks.get(player).copied().unwrap_or(0);
            (expected != actual).then(|| {
                (
                    player,
                    json!({ "expected": expected, "actual": actual }),
                )
            })
        })
        .collect();
    let failure = (!mismatched.is_empty()).then(|| {
        (
            format!("{} player stack(s) don't reconcile", mismatched.len()),
            json!(mismatched),
        )
    });
    GuardResult::check("stack_consistency", GuardSeverity::Error, failure)
}

/// Pots hold exactly what was committed, less rake.
pub fn pot_accuracy(pots: &[Pot], committed: &BTreeMap<PlayerKey, Amount>, rake: Amount) -> GuardResult {
    let in_pots: Amount = pots.iter().map(|p| p.amount).sum();
    let expected = committed.values().sum::<Amount>() - rake;
    let failure = (in_pots != expected).then(|| {
        (
            format!("pots hold {in_pots}, expected {expected}"),
            json!({ "pots": pots, "committed": committed, "rake": rake }),
        )
    });
    GuardResult::check("pot_accuracy", GuardSeverity::Critical, failure)
}

/// Pot levels strictly increase, eligibility only narrows, and every
/// eligible player actually reached the pot's level.
pub fn side_pot_correctness(pots: &[Pot], committed: &BTreeMap<PlayerKey, Amount>) -> GuardResult {
    let mut problems = Vec::new();
    for (i, pair) in pots.windows(2).enumerate() {
        if pair[1].level <= pair[0].level {
            problems.push(format!("pot {} level does not increase", i + 1));
        }
        if !pair[1].eligible.is_subset(&pair[0].eligible) {
            problems.push(format!("pot {} eligibility widens", i + 1));
        }
    }
    for (i, pot) in pots.iter().enumerate() {
        if pot.amount < 0 {
            problems.push(format!("pot {i} is negative"));
        }
        for player in &pot.eligible {
            if committed.get(player).copied().unwrap_or(0) < pot.level {
                problems.push(format!("{player} is eligible for pot {i} below its level"));
            }
        }
    }
    let failure = (!problems.is_empty()).then(|| {
        (
            problems.join("; "),
            json!({ "pots": pots, "committed": committed }),
        )
    });
    GuardResult::check("side_pot_correctness", GuardSeverity::Critical, failure)
}

/// An all-in player can't have put in more than they sat down with.
pub fn all_in_bound(
    all_in: &BTreeSet<PlayerKey>,
    committed: &BTreeMap<PlayerKey, Amount>,
    starting: &BTreeMap<PlayerKey, Amount>,
) -> GuardResult {
    let over: BTreeMap<&PlayerKey, Value> = all_in
        .iter()
        .filter_map(|player| {
            let spent = committed.get(player).copied().unwrap_or(0);
            let stack = starting.get(player).copied().unwrap_or(0);
            (spent > stack).then(|| (player, json!({ "committed": spent, "stack": stack })))
        })
        .collect();
    let failure = (!over.is_empty()).then(|| {
        (
            format!("{} all-in player(s) committed more than their stack", over.len()),
            json!(over),
        )
    });
    GuardResult::check("all_in_bound", GuardSeverity::Critical, failure)
}

pub fn non_negative(name: &str, values: &BTreeMap<PlayerKey, Amount>) -> GuardResult {
    let negative: BTreeMap<&PlayerKey, Amount> =
        values.iter().filter(|(_, v)| **v < 0).map(|(k, v)| (k, *v)).collect();
    let failure = (!negative.is_empty()).then(|| {
        (
            format!("{name} has negative entries"),
            json!(negative),
        )
    });
    GuardResult::check(&format!("non_negative_{name}"), GuardSeverity::Critical, failure)
}

/// Nobody unfolds.
pub fn folded_monotonic(previous: &BTreeSet<PlayerKey>, current: &BTreeSet<PlayerKey>) -> GuardResult {
    let unfolded: Vec<&PlayerKey> = previous.difference(current).collect();
    let failure = (!unfolded.is_empty()).then(|| {
        (
            "folded players reappeared".to_string(),
            json!({ "unfolded": unfolded }),
        )
    });
    GuardResult::check("folded_monotonic", GuardSeverity::Critical, failure)
}

/// The total pot line agrees with what the replay committed.
pub fn reported_total(reported: Amount, computed: Amount) -> GuardResult {
    let failure = (reported != computed).then(|| {
        (
            format!("hand history reports a total pot of {reported}, replay committed {computed}"),
            json!({ "reported": reported, "computed": computed }),
        )
    });
    GuardResult::check("reported_total", GuardSeverity::Warning, failure)
}

/// The collection lines agree with the computed payouts.
pub fn recorded_collections(
    collected: &BTreeMap<PlayerKey, Amount>,
    payouts: &BTreeMap<PlayerKey, Amount>,
) -> GuardResult {
    let nonzero = |m: &BTreeMap<PlayerKey, Amount>| -> BTreeMap<PlayerKey, Amount> {
        m.iter()
            .filter(|(_, v)| **v != 0)
            .map(|(k, v)| (k.clone(), *v))
            .collect()
    };
    let failure = (!collected.is_empty() && nonzero(collected) != nonzero(payouts)).then(|| {
        (
            "recorded collections differ from computed payouts".to_string(),
            json!({ "collected": collected, "payouts": payouts }),
        )
    });
    GuardResult::check("recorded_collections", GuardSeverity::Warning, failure)
}

/// Act on a batch of guard results.
///
/// Non-critical failures are logged and skipped. The first critical failure
/// is logged and returned as an error.
pub fn enforce(
    results: &[GuardResult],
    hand_id: &str,
    sequence: usize,
    log: &dyn AnomalyLog,
) -> Result<(), GuardError> {
    for result in results.iter().filter(|r| !r.passed) {
        let mut entry = AnomalyLogEntry::new(
            hand_id,
            AnomalyKind::GuardFailure,
            format!(
                "{} ({:?}) at snapshot {sequence}: {} {}",
                result.name, result.severity, result.message, result.context
            ),
        );
        if result.is_critical_failure() {
            error!(hand_id, sequence, guard = %result.name, message = %result.message, "Critical guard failure");
            if let Err(e) = log.record(&entry) {
                warn!(error = %e, "Unable to record critical guard failure");
            }
            return Err(GuardError::Critical {
                guard: result.name.clone(),
                sequence,
                message: result.message.clone(),
                context: result.context.clone(),
            });
        }
        warn!(hand_id, sequence, guard = %result.name, message = %result.message, "Guard failure");
        entry = entry.with_fallback("logged and continued");
        if let Err(e) = log.record(&entry) {
            warn!(error = %e, "Unable to record guard failure");
        }
    }
    Ok(())
}
