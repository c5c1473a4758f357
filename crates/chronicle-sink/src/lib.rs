//! # chronicle-sink
//!
//! Audit record sinks for the Chronicle audit engine.
//!
//! ## Overview
//!
//! Two implementations of the `AuditSink` trait from chronicle-core:
//!
//! - [`MemorySink`] — keeps records in a `Vec` behind a `Mutex`; the
//!   reference implementation for tests and demos.
//! - [`JsonLinesSink`] — appends one JSON object per line to a file it
//!   owns, independent of the triggering operation's storage context;
//!   optionally fsyncs per record when configured transactional.
//!
//! Both sinks stamp `created_at` at append time; the capture engine's
//! in-memory timestamp is provisional.

pub mod jsonl;
pub mod memory;

pub use jsonl::JsonLinesSink;
pub use memory::MemorySink;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use chronicle_contracts::record::{AuditRecord, EventKind};
    use chronicle_core::traits::AuditSink;

    use super::{JsonLinesSink, MemorySink};

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn make_record(property: &str) -> AuditRecord {
        AuditRecord::property_change(
            "alice",
            Some("/accounts/42".to_string()),
            "Account",
            EventKind::Update,
            Some("42".to_string()),
            property,
            Some("old".to_string()),
            Some("new".to_string()),
        )
    }

    // ── MemorySink ────────────────────────────────────────────────────────────

    #[test]
    fn memory_sink_appends_in_order() {
        let sink = MemorySink::new();
        sink.append(&make_record("name")).unwrap();
        sink.append(&make_record("age")).unwrap();

        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].property_name.as_deref(), Some("name"));
        assert_eq!(records[1].property_name.as_deref(), Some("age"));
    }

    #[test]
    fn memory_sink_clones_share_backing_store() {
        let sink = MemorySink::new();
        let handle = sink.clone();
        sink.append(&make_record("name")).unwrap();

        assert_eq!(handle.len(), 1);
        assert!(!handle.is_empty());
    }

    /// The sink stamps `created_at` at append time rather than trusting the
    /// record's construction-time value.
    #[test]
    fn memory_sink_restamps_created_at() {
        let sink = MemorySink::new();
        let mut record = make_record("name");
        record.created_at = Utc::now() - chrono::Duration::hours(6);

        sink.append(&record).unwrap();

        let stored = &sink.records()[0];
        let age = Utc::now() - stored.created_at;
        assert!(age < chrono::Duration::minutes(1), "created_at must be re-stamped");
    }

    // ── JsonLinesSink ─────────────────────────────────────────────────────────

    #[test]
    fn jsonl_sink_writes_one_line_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");

        let sink = JsonLinesSink::open(&path, false).unwrap();
        sink.append(&make_record("name")).unwrap();
        sink.append(&make_record("age")).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: AuditRecord = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.property_name.as_deref(), Some("name"));
        assert_eq!(first.actor, "alice");
    }

    #[test]
    fn jsonl_sink_appends_across_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");

        {
            let sink = JsonLinesSink::open(&path, false).unwrap();
            sink.append(&make_record("name")).unwrap();
        }
        {
            let sink = JsonLinesSink::open(&path, false).unwrap();
            sink.append(&make_record("age")).unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }

    #[test]
    fn jsonl_sink_transactional_mode_persists_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");

        let sink = JsonLinesSink::open(&path, true).unwrap();
        sink.append(&make_record("name")).unwrap();

        let contents = std::fs::read_to_string(sink.path()).unwrap();
        assert_eq!(contents.lines().count(), 1);
    }

    /// A sink built from configuration takes its durability mode from the
    /// config's `transactional` flag instead of a hard-coded value.
    #[test]
    fn jsonl_sink_from_config_honors_transactional_flag() {
        let dir = tempfile::tempdir().unwrap();

        let config = chronicle_contracts::config::AuditConfig {
            transactional: true,
            ..chronicle_contracts::config::AuditConfig::default()
        };
        let sink = JsonLinesSink::from_config(dir.path().join("txn.jsonl"), &config).unwrap();
        assert!(sink.is_transactional());
        sink.append(&make_record("name")).unwrap();
        assert_eq!(std::fs::read_to_string(sink.path()).unwrap().lines().count(), 1);

        let relaxed = chronicle_contracts::config::AuditConfig::default();
        let sink = JsonLinesSink::from_config(dir.path().join("buf.jsonl"), &relaxed).unwrap();
        assert!(!sink.is_transactional());
    }

    /// Opening a file in a nonexistent directory surfaces `SinkWrite`.
    #[test]
    fn jsonl_sink_open_failure_is_sink_write() {
        let result = JsonLinesSink::open("/nonexistent-dir/audit.jsonl", false);
        match result {
            Err(chronicle_contracts::error::ChronicleError::SinkWrite { reason }) => {
                assert!(reason.contains("failed to open audit file"));
            }
            other => panic!("expected SinkWrite, got {:?}", other.map(|_| ())),
        }
    }
}
