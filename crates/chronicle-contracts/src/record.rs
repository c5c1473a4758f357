//! Audit record and event kind types.
//!
//! An `AuditRecord` is the durable unit of the audit trail: one record per
//! changed property per lifecycle event, or a single bare marker record for
//! events that carry no per-property detail.  Records are created in memory
//! by the capture engine, persisted exactly once by a sink, and never
//! mutated afterward.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A map from property name to its raw (unrendered) value.
///
/// `BTreeMap` rather than `HashMap` so that iteration order — and therefore
/// record emission order — is deterministic across runs.
pub type ValueMap = BTreeMap<String, serde_json::Value>;

/// The lifecycle event that produced an audit record.
///
/// Wire form is SCREAMING_SNAKE_CASE (`"INSERT"`, `"UPDATE"`, `"DELETE"`)
/// so stored records are unambiguous when read outside this codebase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    Insert,
    Update,
    Delete,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventKind::Insert => "INSERT",
            EventKind::Update => "UPDATE",
            EventKind::Delete => "DELETE",
        };
        f.write_str(s)
    }
}

/// One immutable entry in the audit trail.
///
/// For an update that changed three auditable properties, three records are
/// emitted — one per property.  For a non-verbose insert or delete, a single
/// record is emitted with `property_name`, `old_value`, and `new_value` all
/// `None`: a bare "this event happened" marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Unique identifier assigned at construction.
    pub id: Uuid,

    /// The identity attributed to the change (resolved actor or the
    /// configured default, e.g. `"system"`).
    pub actor: String,

    /// The request URI active when the change was made, if any.
    pub source_uri: Option<String>,

    /// The entity class name, e.g. `"Account"`.
    pub entity_type: String,

    /// Which lifecycle event produced this record.
    pub event_kind: EventKind,

    /// The entity's identifier, rendered as a string.  `None` when the
    /// persistence engine could not supply one (e.g. unsaved instance).
    pub entity_id: Option<String>,

    /// The changed property, or `None` for a bare marker record.
    pub property_name: Option<String>,

    /// Rendered previous value.  `None` for inserts, marker records, and
    /// genuinely-null prior values.
    pub old_value: Option<String>,

    /// Rendered new value.  `None` for deletes, marker records, and
    /// genuinely-null current values.
    pub new_value: Option<String>,

    /// Wall-clock time (UTC) the record was persisted.  Stamped by the sink
    /// at append time, not by the capture engine.
    pub created_at: DateTime<Utc>,
}

impl AuditRecord {
    /// Build a record for one property change.
    ///
    /// `created_at` is initialized to now but is re-stamped by the sink when
    /// the record is actually persisted.
    #[allow(clippy::too_many_arguments)]
    pub fn property_change(
        actor: impl Into<String>,
        source_uri: Option<String>,
        entity_type: impl Into<String>,
        event_kind: EventKind,
        entity_id: Option<String>,
        property_name: impl Into<String>,
        old_value: Option<String>,
        new_value: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            actor: actor.into(),
            source_uri,
            entity_type: entity_type.into(),
            event_kind,
            entity_id,
            property_name: Some(property_name.into()),
            old_value,
            new_value,
            created_at: Utc::now(),
        }
    }

    /// Build a bare marker record: "this event happened", no property detail.
    pub fn marker(
        actor: impl Into<String>,
        source_uri: Option<String>,
        entity_type: impl Into<String>,
        event_kind: EventKind,
        entity_id: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            actor: actor.into(),
            source_uri,
            entity_type: entity_type.into(),
            event_kind,
            entity_id,
            property_name: None,
            old_value: None,
            new_value: None,
            created_at: Utc::now(),
        }
    }

    /// Compact one-line description used when logging a failed persist.
    pub fn describe(&self) -> String {
        format!(
            "{} {} id={} property={} actor={}",
            self.event_kind,
            self.entity_type,
            self.entity_id.as_deref().unwrap_or("<none>"),
            self.property_name.as_deref().unwrap_or("<none>"),
            self.actor,
        )
    }
}
