//! Hand history text, parsed.
//!
//! [`parse`] turns one pasted hand from PokerStars, GGPoker or ACR into a
//! [`HandHistory`]. Every amount in the result is an integer in minor units;
//! [`GameContext`] says whether those units are chips or cents.
mod context;
mod dialect;
mod hand_history;
mod money;
mod parser;
mod validate;

pub use context::{
    ContextClassification, ContextConfidence, ContextSignals, GameContext, classify,
};
pub use hand_history::{
    Action, ActionKind, Collection, HandHistory, Player, PlayerStatus, Showdown, Site,
    StreetActions,
};
pub use money::{
    Amount, AmountError, MAX_SAFE_CHIPS, MAX_SAFE_CURRENCY_MINOR, MoneyUnit, format_amount,
    parse_amount,
};
pub use parser::{MAX_ACTIONS, MAX_INPUT_BYTES, MAX_PLAYERS, ParseError, parse};
pub use validate::{IssueSeverity, ValidationIssue, validate};
