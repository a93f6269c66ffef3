//! Append-only answer history.
//!
//! `MemoryHistory` lives for one session; `JsonlHistory` persists one JSON
//! object per line so history survives across CLI invocations.

use crate::rag::types::LogEntry;
use compliance_core::{AppError, AppResult};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Destination for answered questions.
pub trait HistorySink: Send + Sync {
    fn append(&self, entry: &LogEntry) -> AppResult<()>;

    /// All entries, oldest first.
    fn entries(&self) -> AppResult<Vec<LogEntry>>;

    fn clear(&self) -> AppResult<()>;
}

/// Session-scoped history.
#[derive(Debug, Default)]
pub struct MemoryHistory {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> AppResult<std::sync::MutexGuard<'_, Vec<LogEntry>>> {
        self.entries
            .lock()
            .map_err(|_| AppError::Other("History lock poisoned".to_string()))
    }
}

impl HistorySink for MemoryHistory {
    fn append(&self, entry: &LogEntry) -> AppResult<()> {
        self.lock()?.push(entry.clone());
        Ok(())
    }

    fn entries(&self) -> AppResult<Vec<LogEntry>> {
        Ok(self.lock()?.clone())
    }

    fn clear(&self) -> AppResult<()> {
        self.lock()?.clear();
        Ok(())
    }
}

/// JSON Lines history file.
///
/// Each append opens the file in append mode and writes one full line, so
/// concurrent appenders never interleave within a record.
#[derive(Debug, Clone)]
pub struct JsonlHistory {
    path: PathBuf,
}

impl JsonlHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HistorySink for JsonlHistory {
    fn append(&self, entry: &LogEntry) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| AppError::Knowledge(format!("Failed to open {:?}: {}", self.path, e)))?;
        file.write_all(line.as_bytes())
            .map_err(|e| AppError::Knowledge(format!("Failed to write {:?}: {}", self.path, e)))?;
        file.sync_all()
            .map_err(|e| AppError::Knowledge(format!("Failed to sync {:?}: {}", self.path, e)))?;

        tracing::debug!("Appended history entry to {:?}", self.path);
        Ok(())
    }

    fn entries(&self) -> AppResult<Vec<LogEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)
            .map_err(|e| AppError::Knowledge(format!("Failed to open {:?}: {}", self.path, e)))?;

        let mut entries = Vec::new();
        for (line_num, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| {
                AppError::Knowledge(format!("Failed to read line {}: {}", line_num + 1, e))
            })?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<LogEntry>(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => tracing::warn!(
                    "Skipping malformed history line {} in {:?}: {}",
                    line_num + 1,
                    self.path,
                    e
                ),
            }
        }

        Ok(entries)
    }

    fn clear(&self) -> AppResult<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path).map_err(|e| {
                AppError::Knowledge(format!("Failed to delete {:?}: {}", self.path, e))
            })?;
            tracing::debug!("Cleared history at {:?}", self.path);
        }
        Ok(())
    }
}
