//! Splitting committed chips into pots and paying them out.
mod side_pot;
mod winners;

pub use side_pot::{Pot, PotStatus, SidePotError, calculate_side_pots};
pub use winners::{AwardMethod, PotAward, Settlement, SettlementError, ShowdownFacts, settle};
