//! Poker hand history parsing, replay and settlement.
//!
//! Raw PokerStars, GGPoker and ACR hand histories go in; a verified replay
//! comes out. Every amount is an integer count of chips or currency minor
//! units, so splitting pots never loses a cent.
//!
//! - [`history`] detects the dialect and parses one hand into a
//!   [`history::HandHistory`].
//! - [`settlement`] turns per-player contributions into main and side pots
//!   and pays them out.
//! - [`replay`] rebuilds the table one event at a time, checking every
//!   snapshot with [`guards`].
//! - [`anomaly`] is where pots that couldn't be settled cleanly are written.
//! - [`core`] has cards, the hand evaluator and player key canonicalisation.
//!
//! ```
//! use std::collections::{BTreeMap, BTreeSet};
//!
//! use rs_poker_replay::core::PlayerKey;
//! use rs_poker_replay::settlement::{PotStatus, calculate_side_pots};
//!
//! let committed = BTreeMap::from([
//!     (PlayerKey::new("Short"), 100),
//!     (PlayerKey::new("Deep"), 300),
//!     (PlayerKey::new("Deeper"), 300),
//! ]);
//! let statuses = BTreeMap::from([
//!     (PlayerKey::new("Short"), PotStatus::AllIn),
//!     (PlayerKey::new("Deep"), PotStatus::Active),
//!     (PlayerKey::new("Deeper"), PotStatus::Active),
//! ]);
//! let pots = calculate_side_pots(&committed, &statuses, 0).unwrap();
//! assert_eq!(300, pots[0].amount);
//! assert_eq!(400, pots[1].amount);
//! assert_eq!(
//!     BTreeSet::from([PlayerKey::new("Deep"), PlayerKey::new("Deeper")]),
//!     pots[1].eligible
//! );
//! ```
pub mod anomaly;
pub mod config;
pub mod core;
pub mod guards;
pub mod history;
pub mod pipeline;
pub mod replay;
pub mod settlement;

#[cfg(test)]
mod test_util;

pub use config::SettlementConfig;
pub use pipeline::{PipelineError, ProcessedHand, process_hand};
