//! Core value types shared by every other module: cards, canonical player
//! keys, and hand strength evaluation.

/// Cards, values and suits.
mod card;
pub use self::card::{Card, CardParseError, Suit, Value, format_cards, parse_cards};

/// Player name canonicalization.
mod canonical;
pub use self::canonical::{PlayerKey, canonical_key};

/// Iterate over every k-card combination of a slice.
mod card_iter;
pub use self::card_iter::CardIter;

/// Hand strength evaluation.
mod rank;
pub use self::rank::{
    EvaluateError, HandCategory, HandStrength, MAX_EVALUATED_CARDS, best_of_combinations,
    determine_winners, evaluate, fast_rank, rank_exact,
};
