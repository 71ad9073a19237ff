use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::anomaly::{AnomalyLog, DirectoryAnomalyLog, NullAnomalyLog};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse settlement config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// How settlement behaves when something doesn't add up.
///
/// Passed explicitly to every call that settles a hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettlementConfig {
    /// Abort when a pot's winner can't be determined. When false the pot goes
    /// to the alphabetically first eligible player and the incident is logged.
    pub fail_fast_on_unresolved: bool,
    /// Where anomaly records are written. No records are kept when unset.
    pub anomaly_log_dir: Option<PathBuf>,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            fail_fast_on_unresolved: true,
            anomaly_log_dir: None,
        }
    }
}

impl SettlementConfig {
    /// Creates the default configuration: fail fast, no anomaly directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a configuration from JSON. Missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON or unknown fields.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON configuration file.
    ///
    /// # Arguments
    ///
    /// * `path` - The file to read.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file can't be read and
    /// [`ConfigError::Parse`] if its contents aren't a valid configuration.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Sets whether an unresolvable pot aborts the hand (`true`) or goes to
    /// the first eligible player (`false`).
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast_on_unresolved = fail_fast;
        self
    }

    /// Sets the directory [`SettlementConfig::anomaly_log`] writes to.
    ///
    /// # Arguments
    ///
    /// * `dir` - Directory for `anomalies.jsonl`; created on first write.
    pub fn with_anomaly_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.anomaly_log_dir = Some(dir.into());
        self
    }

    /// Build the configured sink. Call once and pass the result around.
    pub fn anomaly_log(&self) -> Box<dyn AnomalyLog> {
        match &self.anomaly_log_dir {
            Some(dir) => {
                debug!(?dir, "Using directory anomaly log");
                Box::new(DirectoryAnomalyLog::new(dir.clone()))
            }
            None => Box::new(NullAnomalyLog),
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::anomaly::{AnomalyKind, AnomalyLogEntry};

    #[test]
    fn test_default_is_fail_fast() {
        let config = SettlementConfig::default();
        assert!(config.fail_fast_on_unresolved);
        assert!(config.anomaly_log_dir.is_none());
    }

    #[test]
    fn test_from_json() {
        let config =
            SettlementConfig::from_json_str(r#"{"fail_fast_on_unresolved": false}"#).unwrap();
        assert!(!config.fail_fast_on_unresolved);

        let config =
            SettlementConfig::from_json_str(r#"{"anomaly_log_dir": "/tmp/anomalies"}"#).unwrap();
        assert!(config.fail_fast_on_unresolved);
        assert_eq!(Some(PathBuf::from("/tmp/anomalies")), config.anomaly_log_dir);
    }

    #[test]
    fn test_unknown_knob_is_rejected() {
        let err = SettlementConfig::from_json_str(r#"{"verbose": true}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_from_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settlement.json");
        std::fs::write(&path, r#"{"fail_fast_on_unresolved": false}"#).unwrap();
        let config = SettlementConfig::from_path(&path).unwrap();
        assert!(!config.fail_fast_on_unresolved);

        assert!(matches!(
            SettlementConfig::from_path(temp_dir.path().join("missing.json")),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_directory_sink_selected_once() {
        let temp_dir = TempDir::new().unwrap();
        let config = SettlementConfig::new().with_anomaly_log_dir(temp_dir.path());
        let log = config.anomaly_log();
        log.record(&AnomalyLogEntry::new("1", AnomalyKind::GuardFailure, "x"))
            .unwrap();
        assert!(temp_dir.path().join("anomalies.jsonl").exists());
    }
}
