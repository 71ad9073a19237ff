use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::card::{Card, Value};
use crate::core::card_iter::CardIter;

/// Two hole cards plus a full board.
pub const MAX_EVALUATED_CARDS: usize = 7;

/// All the different possible hand categories, weakest first.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Hash, Copy, Serialize, Deserialize)]
pub enum HandCategory {
    /// No matches
    HighCard,
    /// One Card matches another.
    OnePair,
    /// Two different pair of matching cards.
    TwoPair,
    /// Three of the same value.
    ThreeOfAKind,
    /// Five cards in a sequence
    Straight,
    /// Five cards of the same suit
    Flush,
    /// Three of one value and two of another value
    FullHouse,
    /// Four of the same value.
    FourOfAKind,
    /// Five cards in a sequence all for the same suit.
    StraightFlush,
    /// Ten through ace of one suit.
    RoyalFlush,
}

impl fmt::Display for HandCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HandCategory::HighCard => "High Card",
            HandCategory::OnePair => "One Pair",
            HandCategory::TwoPair => "Two Pair",
            HandCategory::ThreeOfAKind => "Three of a Kind",
            HandCategory::Straight => "Straight",
            HandCategory::Flush => "Flush",
            HandCategory::FullHouse => "Full House",
            HandCategory::FourOfAKind => "Four of a Kind",
            HandCategory::StraightFlush => "Straight Flush",
            HandCategory::RoyalFlush => "Royal Flush",
        };
        f.write_str(name)
    }
}

/// The strength of a hand.
///
/// Ordering is lexicographic: category first, then each tie-break value
/// (primary ranks, then kickers, high to low). Field order matters for the
/// derived `Ord`.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Hash, Serialize, Deserialize)]
pub struct HandStrength {
    pub category: HandCategory,
    pub tiebreak: Vec<Value>,
}

#[derive(Error, Debug, PartialEq, Eq, Clone, Hash)]
pub enum EvaluateError {
    #[error("no cards to evaluate")]
    NoCards,
    #[error("expected 2 hole cards, got {0}")]
    HoleCardCount(usize),
    #[error("at most {max} cards can be evaluated, got {0}", max = MAX_EVALUATED_CARDS)]
    TooManyCards(usize),
    #[error("card {0} appears more than once")]
    DuplicateCard(Card),
}

/// Rank a group of one to five cards exactly as they are.
///
/// Straights and flushes need all five cards; smaller groups can only make
/// the pair based categories.
pub fn rank_exact(cards: &[Card]) -> HandStrength {
    let mut counts = [0u8; 13];
    for c in cards {
        counts[c.value as usize] += 1;
    }

    // (count, value) pairs with the most frequent and then highest first.
    let mut groups: Vec<(u8, Value)> = Value::values()
        .into_iter()
        .filter(|v| counts[*v as usize] > 0)
        .map(|v| (counts[v as usize], v))
        .collect();
    groups.sort_unstable_by(|a, b| b.cmp(a));
    let ordered: Vec<Value> = groups.iter().map(|(_, v)| *v).collect();

    if cards.len() == 5 && groups.len() == 5 {
        let is_flush = cards.iter().all(|c| c.suit == cards[0].suit);
        let straight = straight_top(value_bits(cards));
        return match (straight, is_flush) {
            (Some(Value::Ace), true) => HandStrength {
                category: HandCategory::RoyalFlush,
                tiebreak: vec![Value::Ace],
            },
            (Some(top), true) => HandStrength {
                category: HandCategory::StraightFlush,
                tiebreak: vec![top],
            },
            (Some(top), false) => HandStrength {
                category: HandCategory::Straight,
                tiebreak: vec![top],
            },
            (None, true) => HandStrength {
                category: HandCategory::Flush,
                tiebreak: ordered,
            },
            (None, false) => HandStrength {
                category: HandCategory::HighCard,
                tiebreak: ordered,
            },
        };
    }

    let category = match (groups.first().map(|g| g.0), groups.get(1).map(|g| g.0)) {
        (Some(4), _) => HandCategory::FourOfAKind,
        (Some(3), Some(2)) => HandCategory::FullHouse,
        (Some(3), _) => HandCategory::ThreeOfAKind,
        (Some(2), Some(2)) => HandCategory::TwoPair,
        (Some(2), _) => HandCategory::OnePair,
        _ => HandCategory::HighCard,
    };
    HandStrength {
        category,
        tiebreak: ordered,
    }
}

fn value_bits(cards: &[Card]) -> u32 {
    cards.iter().fold(0, |acc, c| acc | (1 << c.value as u32))
}

/// Bit mask for the wheel (Ace, two, three, four, five)
const WHEEL: u32 = 0b1_0000_0000_1111;

/// Given a bitset of card values return the top card of the best straight
/// in it, if there is one. The wheel tops out at the five.
fn straight_top(value_set: u32) -> Option<Value> {
    // A bit survives only if it and the four bits below it are all set.
    let left =
        value_set & (value_set >> 1) & (value_set >> 2) & (value_set >> 3) & (value_set >> 4);
    if left != 0 {
        // Surviving bit p means p-4..=p are set, so shift back up.
        let low = 31 - left.leading_zeros();
        Value::from_u8((low + 4) as u8)
    } else if value_set & WHEEL == WHEEL {
        Some(Value::Five)
    } else {
        None
    }
}

/// Keep only the most significant bit.
fn keep_highest(rank: u32) -> u32 {
    if rank == 0 {
        return 0;
    }
    1 << (32 - rank.leading_zeros() - 1)
}

/// Keep the N most significant bits.
///
/// This works by removing the least significant bits.
fn keep_n(rank: u32, to_keep: u32) -> u32 {
    let mut result = rank;
    while result.count_ones() > to_keep {
        result &= result - 1;
    }
    result
}

/// Expand a value bitset into values, high to low.
fn bits_desc(bits: u32) -> Vec<Value> {
    (0..13u8)
        .rev()
        .filter(|v| bits & (1 << v) != 0)
        .filter_map(Value::from_u8)
        .collect()
}

/// Closed-form ranking of five to seven cards.
///
/// Works on value and suit bitsets instead of trying every five card subset.
/// [`best_of_combinations`] is the reference it must agree with.
pub fn fast_rank(cards: &[Card]) -> HandStrength {
    if cards.len() < 5 {
        return rank_exact(cards);
    }
    let mut value_to_count = [0u8; 13];
    let mut count_to_value = [0u32; 8];
    let mut suit_value_sets = [0u32; 4];
    let mut value_set: u32 = 0;

    for c in cards {
        let v = c.value as u32;
        value_set |= 1 << v;
        value_to_count[v as usize] += 1;
        suit_value_sets[c.suit as usize] |= 1 << v;
    }

    // Now rotate the value to count map.
    for (value, &count) in value_to_count.iter().enumerate() {
        count_to_value[count as usize] |= 1 << value;
    }

    let single = |bits: u32| bits_desc(bits).into_iter().next();
    let strength = |category, tiebreak| HandStrength { category, tiebreak };

    if let Some(flush_set) = suit_value_sets.iter().find(|sv| sv.count_ones() >= 5) {
        // If we can find a straight in the flush then it's a straight flush
        return match straight_top(*flush_set) {
            Some(Value::Ace) => strength(HandCategory::RoyalFlush, vec![Value::Ace]),
            Some(top) => strength(HandCategory::StraightFlush, vec![top]),
            None => strength(HandCategory::Flush, bits_desc(keep_n(*flush_set, 5))),
        };
    }

    if count_to_value[4] != 0 {
        let quad = keep_highest(count_to_value[4]);
        let kicker = keep_highest(value_set ^ quad);
        return strength(
            HandCategory::FourOfAKind,
            [single(quad), single(kicker)].into_iter().flatten().collect(),
        );
    }

    if count_to_value[3].count_ones() >= 2 {
        // Two sets. The best we can make is a full house.
        let set = keep_highest(count_to_value[3]);
        let pair = keep_highest(count_to_value[3] ^ set);
        return strength(
            HandCategory::FullHouse,
            [single(set), single(pair)].into_iter().flatten().collect(),
        );
    }

    if count_to_value[3] != 0 && count_to_value[2] != 0 {
        let pair = keep_highest(count_to_value[2]);
        return strength(
            HandCategory::FullHouse,
            [single(count_to_value[3]), single(pair)]
                .into_iter()
                .flatten()
                .collect(),
        );
    }

    if let Some(top) = straight_top(value_set) {
        return strength(HandCategory::Straight, vec![top]);
    }

    if count_to_value[3] != 0 {
        let mut tiebreak = bits_desc(count_to_value[3]);
        tiebreak.extend(bits_desc(keep_n(value_set ^ count_to_value[3], 2)));
        return strength(HandCategory::ThreeOfAKind, tiebreak);
    }

    if count_to_value[2].count_ones() >= 2 {
        // Three pairs leave the lowest one as a possible kicker.
        let pairs = keep_n(count_to_value[2], 2);
        let mut tiebreak = bits_desc(pairs);
        tiebreak.extend(single(keep_highest(value_set ^ pairs)));
        return strength(HandCategory::TwoPair, tiebreak);
    }

    if count_to_value[2] != 0 {
        let mut tiebreak = bits_desc(count_to_value[2]);
        tiebreak.extend(bits_desc(keep_n(value_set ^ count_to_value[2], 3)));
        return strength(HandCategory::OnePair, tiebreak);
    }

    strength(HandCategory::HighCard, bits_desc(keep_n(value_set, 5)))
}

/// Try every five card subset and keep the strongest.
pub fn best_of_combinations(cards: &[Card]) -> HandStrength {
    if cards.len() <= 5 {
        return rank_exact(cards);
    }
    CardIter::new(cards, 5)
        .map(|five| rank_exact(&five))
        .max()
        .unwrap_or_else(|| rank_exact(cards))
}

/// Evaluate two hole cards against zero to five board cards.
///
/// # Examples
/// ```
/// use rs_poker_replay::core::{HandCategory, evaluate, parse_cards};
///
/// let hole = parse_cards("Ah Kh").unwrap();
/// let board = parse_cards("Qh Jh Th 2c 3d").unwrap();
/// let strength = evaluate(&hole, &board).unwrap();
/// assert_eq!(HandCategory::RoyalFlush, strength.category);
/// ```
pub fn evaluate(hole: &[Card], board: &[Card]) -> Result<HandStrength, EvaluateError> {
    if hole.len() != 2 {
        return Err(EvaluateError::HoleCardCount(hole.len()));
    }
    let total = hole.len() + board.len();
    if total > MAX_EVALUATED_CARDS {
        return Err(EvaluateError::TooManyCards(total));
    }
    let mut all: Vec<Card> = Vec::with_capacity(total);
    for card in hole.iter().chain(board.iter()) {
        if all.contains(card) {
            return Err(EvaluateError::DuplicateCard(*card));
        }
        all.push(*card);
    }
    if all.is_empty() {
        return Err(EvaluateError::NoCards);
    }
    Ok(fast_rank(&all))
}

/// Indices of every hand tied for the best strength.
pub fn determine_winners(hands: &[HandStrength]) -> Vec<usize> {
    let Some(best) = hands.iter().max() else {
        return vec![];
    };
    hands
        .iter()
        .enumerate()
        .filter(|(_, h)| *h == best)
        .map(|(idx, _)| idx)
        .collect()
}
