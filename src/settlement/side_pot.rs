use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, trace, warn};

use crate::core::PlayerKey;
use crate::history::Amount;

/// A player's standing as far as pot eligibility goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PotStatus {
    Active,
    Folded,
    AllIn,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pot {
    pub amount: Amount,
    /// Players who can win this pot.
    pub eligible: BTreeSet<PlayerKey>,
    /// The contribution level that capped this pot.
    pub level: Amount,
    pub is_side: bool,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SidePotError {
    #[error("no contributions to split")]
    Empty,
    #[error("{player} has a negative contribution of {amount}")]
    NegativeContribution { player: PlayerKey, amount: Amount },
    #[error("rake {rake} is outside the pot total {total}")]
    InvalidRake { rake: Amount, total: Amount },
    #[error("contributions overflow")]
    Overflow,
    #[error("pots hold {actual} but contributions less rake are {expected}")]
    ConservationViolated {
        expected: Amount,
        actual: Amount,
        pots: Vec<Pot>,
    },
}

/// Split what every player committed into a main pot and side pots.
///
/// Pots come back ordered by increasing level. Folded players' chips stay
/// in the pots they fell into; anything a folded player put in above the
/// highest active level goes to the top pot. Rake is taken from each pot in
/// proportion to its size, with the rounding remainder coming off the last
/// pot.
///
/// A player with no status entry is treated as active. When nobody is
/// left active the result is empty, and when every contribution is zero
/// the result is a single empty pot.
pub fn calculate_side_pots(
    committed: &BTreeMap<PlayerKey, Amount>,
    status: &BTreeMap<PlayerKey, PotStatus>,
    rake: Amount,
) -> Result<Vec<Pot>, SidePotError> {
    if committed.is_empty() {
        return Err(SidePotError::Empty);
    }
    if let Some((player, amount)) = committed.iter().find(|(_, a)| **a < 0) {
        return Err(SidePotError::NegativeContribution {
            player: player.clone(),
            amount: *amount,
        });
    }
    let total = committed
        .values()
        .try_fold(0 as Amount, |acc, a| acc.checked_add(*a))
        .ok_or(SidePotError::Overflow)?;
    if rake < 0 || rake > total {
        return Err(SidePotError::InvalidRake { rake, total });
    }

    // BTreeMap order doubles as the tie-break between equal contributions.
    let mut active: Vec<(&PlayerKey, Amount)> = Vec::new();
    let mut folded: Vec<Amount> = Vec::new();
    for (player, amount) in committed {
        let s = match status.get(player) {
            Some(s) => *s,
            None => {
                warn!(%player, "No status for player, treating as active");
                PotStatus::Active
            }
        };
        if s == PotStatus::Folded {
            folded.push(*amount);
        } else {
            active.push((player, *amount));
        }
    }

    if active.is_empty() {
        return Ok(vec![]);
    }
    if active.len() == 1 {
        let (player, level) = active[0];
        return conserve(
            vec![Pot {
                amount: total - rake,
                eligible: BTreeSet::from([player.clone()]),
                level,
                is_side: false,
            }],
            total,
            rake,
        );
    }

    let mut levels: Vec<Amount> = active.iter().map(|(_, a)| *a).filter(|a| *a > 0).collect();
    levels.sort_unstable();
    levels.dedup();

    if levels.is_empty() {
        // Nothing committed by anyone still in: one pot holds whatever there is.
        return conserve(
            vec![Pot {
                amount: total - rake,
                eligible: active.iter().map(|(p, _)| (*p).clone()).collect(),
                level: 0,
                is_side: false,
            }],
            total,
            rake,
        );
    }

    let band = |amount: Amount, low: Amount, high: Amount| (amount.min(high) - low).max(0);
    let mut pots = Vec::with_capacity(levels.len());
    let mut previous = 0;
    for (i, &level) in levels.iter().enumerate() {
        let amount: Amount = active
            .iter()
            .map(|(_, a)| band(*a, previous, level))
            .chain(folded.iter().map(|a| band(*a, previous, level)))
            .sum();
        let eligible: BTreeSet<PlayerKey> = active
            .iter()
            .filter(|(_, a)| *a >= level)
            .map(|(p, _)| (*p).clone())
            .collect();
        trace!(level, amount, eligible = eligible.len(), "Formed pot");
        pots.push(Pot {
            amount,
            eligible,
            level,
            is_side: i > 0,
        });
        previous = level;
    }

    let dead: Amount = folded.iter().map(|a| (a - previous).max(0)).sum();
    if dead > 0
        && let Some(top) = pots.last_mut()
    {
        trace!(dead, "Adding dead money to the top pot");
        top.amount += dead;
    }

    apply_rake(&mut pots, rake);
    conserve(pots, total, rake)
}

/// Take `rake` out of the pots in proportion to their size.
fn apply_rake(pots: &mut [Pot], rake: Amount) {
    if rake == 0 || pots.is_empty() {
        return;
    }
    let pre_rake: i128 = pots.iter().map(|p| p.amount as i128).sum();
    if pre_rake == 0 {
        return;
    }
    let mut taken: Amount = 0;
    for pot in pots.iter_mut() {
        let share = (pot.amount as i128 * rake as i128 / pre_rake) as Amount;
        pot.amount -= share;
        taken += share;
    }
    // Remainder comes off the last pot, spilling backwards if it's too small.
    let mut remainder = rake - taken;
    for pot in pots.iter_mut().rev() {
        if remainder == 0 {
            break;
        }
        let take = remainder.min(pot.amount);
        pot.amount -= take;
        remainder -= take;
    }
}

fn conserve(pots: Vec<Pot>, total: Amount, rake: Amount) -> Result<Vec<Pot>, SidePotError> {
    let expected = total - rake;
    let actual: Amount = pots.iter().map(|p| p.amount).sum();
    if actual != expected || pots.iter().any(|p| p.amount < 0) {
        error!(expected, actual, ?pots, "Side pots do not conserve chips");
        return Err(SidePotError::ConservationViolated {
            expected,
            actual,
            pots,
        });
    }
    Ok(pots)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(name: &str) -> PlayerKey {
        PlayerKey::new(name)
    }

    fn maps(
        entries: &[(&str, Amount, PotStatus)],
    ) -> (BTreeMap<PlayerKey, Amount>, BTreeMap<PlayerKey, PotStatus>) {
        let committed = entries.iter().map(|(n, a, _)| (key(n), *a)).collect();
        let status = entries.iter().map(|(n, _, s)| (key(n), *s)).collect();
        (committed, status)
    }

    fn eligible(names: &[&str]) -> BTreeSet<PlayerKey> {
        names.iter().map(|n| key(n)).collect()
    }

    #[test]
    fn test_heads_up_equal_all_in() {
        let (c, s) = maps(&[
            ("a", 5_000, PotStatus::AllIn),
            ("b", 5_000, PotStatus::AllIn),
        ]);
        let pots = calculate_side_pots(&c, &s, 0).unwrap();
        assert_eq!(1, pots.len());
        assert_eq!(10_000, pots[0].amount);
        assert_eq!(eligible(&["a", "b"]), pots[0].eligible);
        assert!(!pots[0].is_side);
    }

    #[test]
    fn test_three_way_all_in() {
        // The big stack's excess was returned as uncalled before settling.
        let (c, s) = maps(&[
            ("short", 800, PotStatus::AllIn),
            ("mid", 1_500, PotStatus::AllIn),
            ("big", 1_500, PotStatus::Active),
        ]);
        let pots = calculate_side_pots(&c, &s, 0).unwrap();
        assert_eq!(2, pots.len());
        assert_eq!(2_400, pots[0].amount);
        assert_eq!(800, pots[0].level);
        assert_eq!(eligible(&["short", "mid", "big"]), pots[0].eligible);
        assert_eq!(1_400, pots[1].amount);
        assert_eq!(eligible(&["mid", "big"]), pots[1].eligible);
        assert!(pots[1].is_side);
    }

    #[test]
    fn test_folded_chips_stay_in_their_band() {
        let (c, s) = maps(&[
            ("x", 500, PotStatus::AllIn),
            ("y", 1_500, PotStatus::Active),
            ("z", 1_000, PotStatus::Folded),
            ("w", 1_500, PotStatus::Active),
        ]);
        let pots = calculate_side_pots(&c, &s, 0).unwrap();
        assert_eq!(2_000, pots[0].amount);
        assert_eq!(eligible(&["x", "y", "w"]), pots[0].eligible);
        assert_eq!(2_500, pots[1].amount);
        assert_eq!(eligible(&["y", "w"]), pots[1].eligible);
    }

    #[test]
    fn test_dead_money_goes_to_top_pot() {
        let (c, s) = maps(&[
            ("x", 500, PotStatus::AllIn),
            ("y", 1_500, PotStatus::AllIn),
            ("z", 2_000, PotStatus::Folded),
        ]);
        let pots = calculate_side_pots(&c, &s, 0).unwrap();
        assert_eq!(2, pots.len());
        assert_eq!(1_500, pots[0].amount);
        // 1000 from y, 1000 from z's band, 500 dead from z.
        assert_eq!(2_500, pots[1].amount);
        assert_eq!(4_000, pots.iter().map(|p| p.amount).sum::<Amount>());
    }

    #[test]
    fn test_rake_split_proportionally() {
        let (c, s) = maps(&[
            ("a", 1_000, PotStatus::AllIn),
            ("b", 1_500, PotStatus::Active),
            ("c", 1_500, PotStatus::Active),
        ]);
        let pots = calculate_side_pots(&c, &s, 35).unwrap();
        // 3000 and 1000 before rake: shares 26 and 8, remainder 1 on the last pot.
        assert_eq!(2_974, pots[0].amount);
        assert_eq!(991, pots[1].amount);
        assert_eq!(3_965, pots.iter().map(|p| p.amount).sum::<Amount>());
    }

    #[test]
    fn test_one_player_left_takes_everything() {
        let (c, s) = maps(&[
            ("a", 300, PotStatus::Folded),
            ("b", 900, PotStatus::Active),
            ("c", 100, PotStatus::Folded),
        ]);
        let pots = calculate_side_pots(&c, &s, 10).unwrap();
        assert_eq!(1, pots.len());
        assert_eq!(1_290, pots[0].amount);
        assert_eq!(eligible(&["b"]), pots[0].eligible);
    }

    #[test]
    fn test_everyone_folded_is_empty() {
        let (c, s) = maps(&[("a", 10, PotStatus::Folded), ("b", 20, PotStatus::Folded)]);
        assert!(calculate_side_pots(&c, &s, 0).unwrap().is_empty());
    }

    #[test]
    fn test_all_zero_is_single_empty_pot() {
        let (c, s) = maps(&[
            ("a", 0, PotStatus::Active),
            ("b", 0, PotStatus::Active),
            ("c", 0, PotStatus::Folded),
        ]);
        let pots = calculate_side_pots(&c, &s, 0).unwrap();
        assert_eq!(1, pots.len());
        assert_eq!(0, pots[0].amount);
        assert_eq!(0, pots[0].level);
        assert_eq!(eligible(&["a", "b"]), pots[0].eligible);
    }

    #[test]
    fn test_missing_status_defaults_to_active() {
        let (c, _) = maps(&[("a", 100, PotStatus::Active), ("b", 100, PotStatus::Active)]);
        let s = BTreeMap::from([(key("a"), PotStatus::Folded)]);
        let pots = calculate_side_pots(&c, &s, 0).unwrap();
        assert_eq!(eligible(&["b"]), pots[0].eligible);
        assert_eq!(200, pots[0].amount);
    }

    #[test]
    fn test_rejections() {
        let s = BTreeMap::new();
        assert_eq!(
            Err(SidePotError::Empty),
            calculate_side_pots(&BTreeMap::new(), &s, 0)
        );
        let c = BTreeMap::from([(key("a"), -1)]);
        assert!(matches!(
            calculate_side_pots(&c, &s, 0),
            Err(SidePotError::NegativeContribution { .. })
        ));
        let c = BTreeMap::from([(key("a"), 10), (key("b"), 10)]);
        assert_eq!(
            Err(SidePotError::InvalidRake { rake: 21, total: 20 }),
            calculate_side_pots(&c, &s, 21)
        );
    }

    #[test]
    fn test_levels_increase_and_eligibility_shrinks() {
        let (c, s) = maps(&[
            ("a", 100, PotStatus::AllIn),
            ("b", 250, PotStatus::AllIn),
            ("c", 400, PotStatus::AllIn),
            ("d", 700, PotStatus::Active),
            ("e", 700, PotStatus::Active),
            ("f", 50, PotStatus::Folded),
        ]);
        let pots = calculate_side_pots(&c, &s, 7).unwrap();
        for pair in pots.windows(2) {
            assert!(pair[0].level < pair[1].level);
            assert!(pair[0].eligible.len() >= pair[1].eligible.len());
            assert!(pair[1].eligible.is_subset(&pair[0].eligible));
        }
        assert_eq!(2_200 - 7, pots.iter().map(|p| p.amount).sum::<Amount>());
    }
}
