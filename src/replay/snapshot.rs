use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::{Card, PlayerKey};
use crate::history::Amount;
use crate::settlement::{Pot, PotAward};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Street {
    Preflop,
    Flop,
    Turn,
    River,
    Showdown,
}

impl fmt::Display for Street {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Street::Preflop => "Preflop",
            Street::Flop => "Flop",
            Street::Turn => "Turn",
            Street::River => "River",
            Street::Showdown => "Showdown",
        };
        f.write_str(s)
    }
}

/// Payouts, only present on the final snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowdownPayout {
    pub payouts: BTreeMap<PlayerKey, Amount>,
    /// Stacks after the pots were paid.
    pub final_stacks: BTreeMap<PlayerKey, Amount>,
    pub awards: Vec<PotAward>,
}

/// The table after one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub sequence: usize,
    pub street: Street,
    pub description: String,
    pub board: Vec<Card>,
    /// Ordered by increasing level.
    pub pots: Vec<Pot>,
    pub stacks: BTreeMap<PlayerKey, Amount>,
    /// Everything each player has put in this hand.
    pub committed: BTreeMap<PlayerKey, Amount>,
    /// Chips still in front of a player on the current street. Zero entries
    /// are left out.
    pub pending: BTreeMap<PlayerKey, Amount>,
    pub folded: BTreeSet<PlayerKey>,
    pub all_in: BTreeMap<PlayerKey, bool>,
    pub revealed: BTreeMap<PlayerKey, Vec<Card>>,
    /// Zero everywhere except the final snapshot.
    pub rake_applied: Amount,
    pub showdown: Option<ShowdownPayout>,
}

impl Snapshot {
    pub fn pot_total(&self) -> Amount {
        self.pots.iter().map(|p| p.amount).sum()
    }

    pub fn is_terminal(&self) -> bool {
        self.showdown.is_some()
    }
}

/// Every snapshot of a hand, in order. Read-only once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replay {
    hand_id: String,
    snapshots: Vec<Snapshot>,
}

impl Replay {
    pub(crate) fn new(hand_id: String, snapshots: Vec<Snapshot>) -> Self {
        Replay { hand_id, snapshots }
    }

    /// The id of the hand this replay was built from.
    pub fn hand_id(&self) -> &str {
        &self.hand_id
    }

    /// Every snapshot, ordered by `sequence`.
    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    /// Number of snapshots, the showdown snapshot included.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Iterate over the snapshots in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Snapshot> {
        self.snapshots.iter()
    }

    /// The showdown snapshot. Every successfully built replay has one.
    pub fn terminal(&self) -> Option<&Snapshot> {
        self.snapshots.last().filter(|s| s.is_terminal())
    }

    /// What each player won at showdown.
    pub fn payouts(&self) -> Option<&BTreeMap<PlayerKey, Amount>> {
        self.terminal()
            .and_then(|s| s.showdown.as_ref())
            .map(|s| &s.payouts)
    }
}

impl<'a> IntoIterator for &'a Replay {
    type Item = &'a Snapshot;
    type IntoIter = std::slice::Iter<'a, Snapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
