use tracing::warn;

use super::{AnomalyLog, AnomalyLogEntry, AnomalyLogError};

/// A sink that refuses every record.
///
/// Useful for checking what settlement does when its audit trail can't be
/// written.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingAnomalyLog;

impl AnomalyLog for FailingAnomalyLog {
    fn record(&self, entry: &AnomalyLogEntry) -> Result<(), AnomalyLogError> {
        warn!(incident_id = %entry.incident_id, "FailingAnomalyLog intentionally returning error");
        Err(AnomalyLogError::Unavailable)
    }
}
