//! Append-only record of settlement incidents.
//!
//! Guard failures and pots whose winner couldn't be worked out are written
//! here with enough context to audit the decision later. The sink is always
//! passed in by the caller; nothing in this crate picks one on its own.
use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::core::PlayerKey;
use crate::history::Amount;
use crate::settlement::PotStatus;

mod directory_log;
mod failing;
mod null;
mod vec_log;

pub use directory_log::DirectoryAnomalyLog;
pub use failing::FailingAnomalyLog;
pub use null::NullAnomalyLog;
pub use vec_log::VecAnomalyLog;

/// Recorded as the fallback when the operation was stopped instead.
pub const OPERATION_ABORTED: &str = "operation aborted";

#[derive(Error, Debug)]
pub enum AnomalyLogError {
    #[error("unable to write anomaly record: {0}")]
    Io(#[from] std::io::Error),
    #[error("unable to serialize anomaly record: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("anomaly log lock poisoned")]
    Poisoned,
    #[error("anomaly log is unavailable")]
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    /// A pot had eligible players but none could be named the winner.
    UnresolvedWinner,
    /// A guard reported a failure.
    GuardFailure,
    /// Pots don't add up to what was committed.
    ConservationViolation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnomalyLogEntry {
    pub incident_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub hand_id: String,
    pub kind: AnomalyKind,
    pub pot_index: Option<usize>,
    pub pot_amount: Option<Amount>,
    pub eligible: BTreeSet<PlayerKey>,
    pub contributions: BTreeMap<PlayerKey, Amount>,
    pub statuses: BTreeMap<PlayerKey, PotStatus>,
    pub description: String,
    /// What was done about it, or [`OPERATION_ABORTED`].
    pub fallback: String,
}

impl AnomalyLogEntry {
    pub fn new(hand_id: &str, kind: AnomalyKind, description: impl Into<String>) -> Self {
        AnomalyLogEntry {
            incident_id: Uuid::now_v7(),
            timestamp: Utc::now(),
            hand_id: hand_id.to_string(),
            kind,
            pot_index: None,
            pot_amount: None,
            eligible: BTreeSet::new(),
            contributions: BTreeMap::new(),
            statuses: BTreeMap::new(),
            description: description.into(),
            fallback: OPERATION_ABORTED.to_string(),
        }
    }

    pub fn with_pot(mut self, index: usize, amount: Amount, eligible: &BTreeSet<PlayerKey>) -> Self {
        self.pot_index = Some(index);
        self.pot_amount = Some(amount);
        self.eligible = eligible.clone();
        self
    }

    pub fn with_contributions(
        mut self,
        contributions: &BTreeMap<PlayerKey, Amount>,
        statuses: &BTreeMap<PlayerKey, PotStatus>,
    ) -> Self {
        self.contributions = contributions.clone();
        self.statuses = statuses.clone();
        self
    }

    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = fallback.into();
        self
    }
}

/// Somewhere to put anomaly records.
///
/// Implementations must keep each record whole when called from several
/// threads at once.
pub trait AnomalyLog: Send + Sync {
    fn record(&self, entry: &AnomalyLogEntry) -> Result<(), AnomalyLogError>;
}

impl<T: AnomalyLog + ?Sized> AnomalyLog for Box<T> {
    fn record(&self, entry: &AnomalyLogEntry) -> Result<(), AnomalyLogError> {
        (**self).record(entry)
    }
}
