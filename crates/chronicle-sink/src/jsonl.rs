//! Append-only JSON-lines file sink.
//!
//! `JsonLinesSink` writes one JSON object per line to a file it owns.  The
//! file handle is independent of whatever storage context the triggering
//! business operation uses, so audit rows written for a delete may survive
//! even if the business delete is later rolled back — that is deliberate,
//! documented behavior of the audit trail, not a defect.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use tracing::debug;

use chronicle_contracts::{
    config::AuditConfig,
    error::{ChronicleError, ChronicleResult},
    record::AuditRecord,
};
use chronicle_core::traits::AuditSink;

/// A durable sink appending one JSON record per line.
///
/// With `transactional = true`, every append is followed by an fsync —
/// the explicit per-record durability boundary.  Without it, writes are
/// flushed to the OS but not synced.
pub struct JsonLinesSink {
    path: PathBuf,
    file: Mutex<File>,
    transactional: bool,
}

impl JsonLinesSink {
    /// Open (or create) the file at `path` in append mode.
    pub fn open(path: impl AsRef<Path>, transactional: bool) -> ChronicleResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| ChronicleError::SinkWrite {
                reason: format!("failed to open audit file '{}': {}", path.display(), e),
            })?;
        debug!(path = %path.display(), transactional, "opened JSON-lines audit sink");
        Ok(Self { path, file: Mutex::new(file), transactional })
    }

    /// Open the sink with durability driven by the loaded configuration's
    /// `transactional` flag.
    pub fn from_config(path: impl AsRef<Path>, config: &AuditConfig) -> ChronicleResult<Self> {
        Self::open(path, config.transactional)
    }

    /// The file this sink appends to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether every append is followed by an fsync.
    pub fn is_transactional(&self) -> bool {
        self.transactional
    }
}

impl AuditSink for JsonLinesSink {
    /// Stamp `created_at`, serialize to one JSON line, and append it.
    fn append(&self, record: &AuditRecord) -> ChronicleResult<()> {
        let mut stored = record.clone();
        stored.created_at = Utc::now();

        let line = serde_json::to_string(&stored).map_err(|e| ChronicleError::SinkWrite {
            reason: format!("failed to serialize audit record: {}", e),
        })?;

        let mut file = self.file.lock().map_err(|e| ChronicleError::SinkWrite {
            reason: format!("audit file lock poisoned: {}", e),
        })?;

        writeln!(file, "{}", line).map_err(|e| ChronicleError::SinkWrite {
            reason: format!("failed to append to '{}': {}", self.path.display(), e),
        })?;

        if self.transactional {
            file.sync_data().map_err(|e| ChronicleError::SinkWrite {
                reason: format!("failed to sync '{}': {}", self.path.display(), e),
            })?;
        } else {
            file.flush().map_err(|e| ChronicleError::SinkWrite {
                reason: format!("failed to flush '{}': {}", self.path.display(), e),
            })?;
        }

        Ok(())
    }
}
