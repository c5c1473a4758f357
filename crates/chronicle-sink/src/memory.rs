//! In-memory implementation of `AuditSink`.
//!
//! `MemorySink` is the reference sink: it keeps every appended record in a
//! `Vec` behind a `Mutex`, making it safe to share across the threads that
//! drive the capture engine.  Use it in tests and demos, or anywhere the
//! trail only needs to live as long as the process.

use std::sync::{Arc, Mutex};

use chrono::Utc;

use chronicle_contracts::{
    error::{ChronicleError, ChronicleResult},
    record::AuditRecord,
};
use chronicle_core::traits::AuditSink;

/// An in-memory, append-only audit sink.
///
/// # Thread safety
///
/// `append` acquires a `Mutex` internally.  Clones share the same backing
/// store, so a test can keep one handle while the engine owns another.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<AuditRecord>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every record appended so far, in append order.
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().expect("audit sink lock poisoned").clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().expect("audit sink lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditSink for MemorySink {
    /// Stamp `created_at` on a copy of the record and append it.
    ///
    /// Returns `Err(SinkWrite)` only if the internal mutex is poisoned,
    /// which cannot happen under normal operation.
    fn append(&self, record: &AuditRecord) -> ChronicleResult<()> {
        let mut stored = record.clone();
        stored.created_at = Utc::now();

        let mut records = self.records.lock().map_err(|e| ChronicleError::SinkWrite {
            reason: format!("audit sink lock poisoned: {}", e),
        })?;
        records.push(stored);
        Ok(())
    }
}
