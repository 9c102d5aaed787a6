//! Trace sinks: where finished turn records go.
//!
//! The orchestrator hands each record to a sink exactly once; sinks never
//! feed anything back into control flow.

use crate::TelemetryError;
use crate::model::TraceRecord;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError, RwLock};

/// Receives one record per completed turn.
pub trait TraceSink: Send + Sync {
    fn emit(&self, record: &TraceRecord) -> Result<(), TelemetryError>;
}

// ── In-memory ─────────────────────────────────────────────────────────────

/// Keeps every record in memory (most recent last).
#[derive(Default)]
pub struct MemorySink {
    records: RwLock<Vec<TraceRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all records.
    pub fn records(&self) -> Vec<TraceRecord> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last(&self) -> Option<TraceRecord> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TraceSink for MemorySink {
    fn emit(&self, record: &TraceRecord) -> Result<(), TelemetryError> {
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
        Ok(())
    }
}

// ── JSON lines ────────────────────────────────────────────────────────────

/// Appends one JSON object per line to a file.
pub struct JsonlSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonlSink {
    /// Open (or create) the file in append mode.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, TelemetryError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TraceSink for JsonlSink {
    fn emit(&self, record: &TraceRecord) -> Result<(), TelemetryError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        file.write_all(line.as_bytes())?;
        file.flush()?;
        Ok(())
    }
}

// ── Discard ───────────────────────────────────────────────────────────────

/// Drops every record.
pub struct NoopSink;

impl TraceSink for NoopSink {
    fn emit(&self, _record: &TraceRecord) -> Result<(), TelemetryError> {
        Ok(())
    }
}
