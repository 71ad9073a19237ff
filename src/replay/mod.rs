//! Step-by-step reconstruction of a parsed hand.
//!
//! [`build`] folds the action log into a [`Replay`]: one [`Snapshot`] for
//! the posted blinds, one per street change and one per action, and a final
//! showdown snapshot carrying the payouts. Every snapshot is checked against
//! the money guards before the next one is built.
mod builder;
mod snapshot;

pub use builder::{ReplayError, build};
pub use snapshot::{Replay, ShowdownPayout, Snapshot, Street};
