use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, instrument};

use super::{AnomalyLog, AnomalyLogEntry, AnomalyLogError};

const FILE_NAME: &str = "anomalies.jsonl";

/// Appends one JSON record per line to `anomalies.jsonl` in a directory.
#[derive(Debug)]
pub struct DirectoryAnomalyLog {
    base_path: PathBuf,
    lock: Mutex<()>,
}

impl DirectoryAnomalyLog {
    /// Creates a new `DirectoryAnomalyLog` writing under `base_path`.
    ///
    /// # Arguments
    ///
    /// * `base_path` - Directory that will hold the JSON Lines file. It is
    ///   created on first write if it doesn't exist.
    pub fn new(base_path: PathBuf) -> Self {
        debug!(?base_path, "Creating DirectoryAnomalyLog");
        DirectoryAnomalyLog {
            base_path,
            lock: Mutex::new(()),
        }
    }

    /// The file every record is appended to.
    pub fn file_path(&self) -> PathBuf {
        self.base_path.join(FILE_NAME)
    }

    /// Read every record written so far.
    pub fn read_entries(&self) -> Result<Vec<AnomalyLogEntry>, AnomalyLogError> {
        let _guard = self.lock.lock().map_err(|_| AnomalyLogError::Poisoned)?;
        let path = self.file_path();
        if !path.exists() {
            return Ok(vec![]);
        }
        read_lines(&path)
    }
}

fn read_lines(path: &Path) -> Result<Vec<AnomalyLogEntry>, AnomalyLogError> {
    let reader = BufReader::new(File::open(path)?);
    let mut entries = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        entries.push(serde_json::from_str(&line)?);
    }
    Ok(entries)
}

impl AnomalyLog for DirectoryAnomalyLog {
    #[instrument(level = "trace", skip(self, entry), fields(base_path = ?self.base_path, incident_id = %entry.incident_id))]
    fn record(&self, entry: &AnomalyLogEntry) -> Result<(), AnomalyLogError> {
        // Serialize before taking the lock so the critical section is just the write.
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let _guard = self.lock.lock().map_err(|_| AnomalyLogError::Poisoned)?;
        if !self.base_path.exists() {
            debug!(?self.base_path, "Creating directory for anomaly log");
            std::fs::create_dir_all(&self.base_path)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.file_path())?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use tempfile::TempDir;

    use super::*;
    use crate::anomaly::AnomalyKind;

    #[test]
    fn test_creates_directory_when_missing() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("anomalies");
        assert!(!path.exists());

        let log = DirectoryAnomalyLog::new(path.clone());
        log.record(&AnomalyLogEntry::new("1", AnomalyKind::GuardFailure, "x"))
            .unwrap();

        assert!(path.join("anomalies.jsonl").exists());
    }

    #[test]
    fn test_appends_one_line_per_record() {
        let temp_dir = TempDir::new().unwrap();
        let log = DirectoryAnomalyLog::new(temp_dir.path().to_path_buf());
        for i in 0..3 {
            log.record(&AnomalyLogEntry::new(
                &i.to_string(),
                AnomalyKind::UnresolvedWinner,
                "no cards",
            ))
            .unwrap();
        }
        let content = std::fs::read_to_string(log.file_path()).unwrap();
        assert_eq!(3, content.lines().count());

        let entries = log.read_entries().unwrap();
        let ids: Vec<&str> = entries.iter().map(|e| e.hand_id.as_str()).collect();
        assert_eq!(vec!["0", "1", "2"], ids);
    }

    #[test]
    fn test_read_without_writes_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let log = DirectoryAnomalyLog::new(temp_dir.path().join("never"));
        assert!(log.read_entries().unwrap().is_empty());
    }

    #[test]
    fn test_concurrent_writers_never_interleave() {
        let temp_dir = TempDir::new().unwrap();
        let log = Arc::new(DirectoryAnomalyLog::new(temp_dir.path().to_path_buf()));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let log = Arc::clone(&log);
                thread::spawn(move || {
                    for i in 0..25 {
                        let entry = AnomalyLogEntry::new(
                            &format!("{t}-{i}"),
                            AnomalyKind::GuardFailure,
                            "x".repeat(512),
                        );
                        log.record(&entry).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        // Every line parses, so no record was split by another.
        assert_eq!(200, log.read_entries().unwrap().len());
    }
}
