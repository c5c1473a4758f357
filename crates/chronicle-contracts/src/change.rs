//! The transient change set built for one lifecycle event.
//!
//! A `ChangeSet` exists only for the duration of one event handling pass.
//! It is never persisted as such — only its rendered diffs become
//! `AuditRecord`s.

use serde::{Deserialize, Serialize};

use crate::record::{EventKind, ValueMap};

/// Raw old/new state captured for a single entity lifecycle event.
///
/// - Insert: `new_values` populated, `old_values` absent.
/// - Delete: `old_values` populated, `new_values` absent.
/// - Update: both populated, keyed by the same (filtered) property set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeSet {
    /// The entity class name, e.g. `"Account"`.
    pub entity_class: String,

    /// The entity identifier rendered to a string, if available.
    pub entity_id: Option<String>,

    /// Which lifecycle event this change set describes.
    pub kind: EventKind,

    /// Prior values keyed by property name.  Raw, unrendered.
    pub old_values: Option<ValueMap>,

    /// Current values keyed by property name.  Raw, unrendered.
    pub new_values: Option<ValueMap>,
}
