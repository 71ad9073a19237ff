use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::anomaly::{AnomalyKind, AnomalyLog, AnomalyLogEntry, AnomalyLogError};
use crate::config::SettlementConfig;
use crate::core::{Card, HandStrength, PlayerKey, determine_winners, evaluate};
use crate::history::Amount;

use super::side_pot::{Pot, PotStatus};

#[derive(Error, Debug)]
pub enum SettlementError {
    #[error("pot {pot_index} ({amount}) has no resolvable winner: {reason}")]
    UnresolvedWinner {
        pot_index: usize,
        amount: Amount,
        reason: String,
    },
    #[error(transparent)]
    AnomalyLog(#[from] AnomalyLogError),
}

/// How a pot's winners were picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AwardMethod {
    /// Only one player was eligible.
    Uncontested,
    /// Taken from the hand's recorded winners.
    Recorded,
    /// Decided by comparing hands.
    Evaluated,
    /// Nothing could decide it; handed to the first eligible player.
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PotAward {
    pub pot_index: usize,
    pub amount: Amount,
    /// Ordered by seat.
    pub winners: Vec<PlayerKey>,
    pub method: AwardMethod,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub payouts: BTreeMap<PlayerKey, Amount>,
    pub awards: Vec<PotAward>,
}

impl Settlement {
    pub fn total(&self) -> Amount {
        self.payouts.values().sum()
    }
}

/// Everything known at showdown that can decide a pot.
#[derive(Debug, Clone, Copy)]
pub struct ShowdownFacts<'a> {
    pub hand_id: &'a str,
    pub board: &'a [Card],
    /// Known hole cards. Players missing here can't be evaluated.
    pub hole_cards: &'a BTreeMap<PlayerKey, Vec<Card>>,
    pub seats: &'a BTreeMap<PlayerKey, u8>,
    /// Everyone the hand history says collected something.
    pub recorded_winners: &'a BTreeSet<PlayerKey>,
    pub committed: &'a BTreeMap<PlayerKey, Amount>,
    pub statuses: &'a BTreeMap<PlayerKey, PotStatus>,
}

impl ShowdownFacts<'_> {
    fn seat(&self, key: &PlayerKey) -> u8 {
        self.seats.get(key).copied().unwrap_or(u8::MAX)
    }

    /// The best hands among `players`, or why they can't be compared.
    fn best_hands(&self, players: &BTreeSet<PlayerKey>) -> Result<Vec<PlayerKey>, String> {
        let keys: Vec<&PlayerKey> = players.iter().collect();
        let mut strengths: Vec<HandStrength> = Vec::with_capacity(keys.len());
        for key in &keys {
            let hole = self
                .hole_cards
                .get(*key)
                .filter(|h| h.len() == 2)
                .ok_or_else(|| format!("hole cards unknown for {key}"))?;
            let strength = evaluate(hole, self.board).map_err(|e| format!("{key}: {e}"))?;
            strengths.push(strength);
        }
        Ok(determine_winners(&strengths)
            .into_iter()
            .map(|i| keys[i].clone())
            .collect())
    }

    fn all_cards_known(&self, players: &BTreeSet<PlayerKey>) -> bool {
        players
            .iter()
            .all(|p| self.hole_cards.get(p).is_some_and(|h| h.len() == 2))
    }
}

/// Pay every pot, lowest level first.
///
/// Split pots are divided evenly; odd chips go one each to the winners in
/// seat order starting from the lowest seat.
///
/// A pot nobody can win is written to `log` and the call fails. With
/// `fail_fast_on_unresolved` off, a pot whose winner is merely unknown goes
/// to its first eligible player instead. A pot with no eligible player at
/// all still fails because there is nobody to fall back to.
pub fn settle(
    pots: &[Pot],
    facts: &ShowdownFacts<'_>,
    config: &SettlementConfig,
    log: &dyn AnomalyLog,
) -> Result<Settlement, SettlementError> {
    let mut settlement = Settlement::default();
    for (pot_index, pot) in pots.iter().enumerate() {
        let (mut winners, method) = match resolve(pot, facts) {
            Ok(resolved) => resolved,
            Err(reason) => unresolved(pot_index, pot, reason, facts, config, log)?,
        };
        winners.sort_by_key(|k| (facts.seat(k), k.clone()));

        let count = winners.len() as Amount;
        let share = pot.amount / count;
        let odd = pot.amount % count;
        for (i, winner) in winners.iter().enumerate() {
            let extra = if (i as Amount) < odd { 1 } else { 0 };
            *settlement.payouts.entry(winner.clone()).or_default() += share + extra;
        }
        debug!(pot_index, amount = pot.amount, ?winners, ?method, "Awarded pot");
        settlement.awards.push(PotAward {
            pot_index,
            amount: pot.amount,
            winners,
            method,
        });
    }
    Ok(settlement)
}

fn resolve(pot: &Pot, facts: &ShowdownFacts<'_>) -> Result<(Vec<PlayerKey>, AwardMethod), String> {
    if pot.eligible.len() == 1 {
        return Ok((pot.eligible.iter().cloned().collect(), AwardMethod::Uncontested));
    }
    if pot.eligible.is_empty() {
        return Err("no eligible players".to_string());
    }

    let recorded: BTreeSet<PlayerKey> = pot
        .eligible
        .intersection(facts.recorded_winners)
        .cloned()
        .collect();
    if recorded.len() == 1 {
        return Ok((recorded.into_iter().collect(), AwardMethod::Recorded));
    }
    if !recorded.is_empty() {
        // Collection lines can mix pots; cards settle who actually won this one.
        if facts.all_cards_known(&recorded) {
            return facts
                .best_hands(&recorded)
                .map(|w| (w, AwardMethod::Recorded));
        }
        return Ok((recorded.into_iter().collect(), AwardMethod::Recorded));
    }

    facts
        .best_hands(&pot.eligible)
        .map(|w| (w, AwardMethod::Evaluated))
}

fn unresolved(
    pot_index: usize,
    pot: &Pot,
    reason: String,
    facts: &ShowdownFacts<'_>,
    config: &SettlementConfig,
    log: &dyn AnomalyLog,
) -> Result<(Vec<PlayerKey>, AwardMethod), SettlementError> {
    let entry = AnomalyLogEntry::new(
        facts.hand_id,
        AnomalyKind::UnresolvedWinner,
        format!("pot {pot_index} has no resolvable winner: {reason}"),
    )
    .with_pot(pot_index, pot.amount, &pot.eligible)
    .with_contributions(facts.committed, facts.statuses);

    // An empty eligible set aborts under either policy.
    let fallback = match pot.eligible.first() {
        Some(first) if !config.fail_fast_on_unresolved => first.clone(),
        _ => {
            warn!(hand_id = facts.hand_id, pot_index, %reason, "Aborting settlement");
            log.record(&entry)?;
            return Err(SettlementError::UnresolvedWinner {
                pot_index,
                amount: pot.amount,
                reason,
            });
        }
    };

    warn!(hand_id = facts.hand_id, pot_index, %reason, winner = %fallback, "Settling pot by fallback");
    log.record(&entry.with_fallback(format!("awarded to {fallback}, first eligible player")))?;
    Ok((vec![fallback], AwardMethod::Fallback))
}
