use std::sync::Mutex;

use super::{AnomalyLog, AnomalyLogEntry, AnomalyLogError};

/// Keeps records in memory so callers can inspect them.
#[derive(Debug, Default)]
pub struct VecAnomalyLog {
    entries: Mutex<Vec<AnomalyLogEntry>>,
}

impl VecAnomalyLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of every record so far, oldest first.
    pub fn entries(&self) -> Vec<AnomalyLogEntry> {
        self.entries
            .lock()
            .map(|e| e.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map_or(0, |e| e.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AnomalyLog for VecAnomalyLog {
    fn record(&self, entry: &AnomalyLogEntry) -> Result<(), AnomalyLogError> {
        self.entries
            .lock()
            .map_err(|_| AnomalyLogError::Poisoned)?
            .push(entry.clone());
        Ok(())
    }
}
