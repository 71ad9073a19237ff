use super::{AnomalyLog, AnomalyLogEntry, AnomalyLogError};

/// Discards every record.
///
/// The default sink when no log directory is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAnomalyLog;

impl AnomalyLog for NullAnomalyLog {
    fn record(&self, _entry: &AnomalyLogEntry) -> Result<(), AnomalyLogError> {
        Ok(())
    }
}
