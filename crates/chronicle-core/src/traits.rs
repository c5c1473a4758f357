//! Core trait definitions for the Chronicle audit pipeline.
//!
//! These traits define the seam between the capture engine and its two
//! external collaborators:
//!
//! - `EntityAdapter` — implemented by the persistence engine; supplies
//!   entity introspection (property names, dirty sets, prior/current
//!   values, identifiers) and probes for optional per-entity callbacks.
//! - `AuditSink`    — the durable destination for constructed records.
//!
//! The capture engine never touches the persistence engine directly; every
//! fact it learns about an entity flows through `EntityAdapter`.

use chronicle_contracts::{
    error::ChronicleResult,
    record::{AuditRecord, ValueMap},
};

/// Callback fired after an auditable entity is inserted.
///
/// Receives the raw (unformatted, unmasked) new values.  Fired regardless
/// of handlers-only mode.
pub trait SaveHandler {
    fn on_save(&self, new_values: &ValueMap);
}

/// Callback fired before an auditable entity is deleted.
///
/// Receives the raw prior values.  Fired regardless of handlers-only mode.
pub trait DeleteHandler {
    fn on_delete(&self, old_values: &ValueMap);
}

/// Two-argument change callback: separate old and new maps.
pub trait ChangeHandler {
    fn on_change(&self, old_values: &ValueMap, new_values: &ValueMap);
}

/// Single-argument change callback: one merged map.
///
/// Each changed property maps to a `{"old": …, "new": …}` object so the
/// handler still sees both sides of the diff.
pub trait CombinedChangeHandler {
    fn on_change(&self, changes: &ValueMap);
}

/// Whichever change-callback shape an entity type implements.
///
/// Arity is resolved statically by probing the adapter — never by runtime
/// introspection of the callback itself.
pub enum ChangeHandlers<'a> {
    TwoArg(&'a dyn ChangeHandler),
    SingleArg(&'a dyn CombinedChangeHandler),
}

/// Abstraction over one persisted entity instance.
///
/// Implemented by the persistence engine's integration layer.  Raw values
/// are surfaced as `serde_json::Value` so the capture engine can diff and
/// render them without knowing concrete entity types.
pub trait EntityAdapter: Send + Sync {
    /// The entity class name used for policy lookup and audit records.
    fn entity_class(&self) -> &str;

    /// Every persistent property of the entity class.
    fn persistent_properties(&self) -> Vec<String>;

    /// True if the named property is a collection-valued association.
    fn is_collection(&self, property: &str) -> bool;

    /// Property names the engine's dirty tracking reports as modified.
    fn dirty_properties(&self) -> Vec<String>;

    /// Collection-valued associations whose collection reports itself dirty
    /// independently of the standard dirty-tracking mechanism.  The capture
    /// engine unions these with `dirty_properties()` on update.
    fn dirty_collections(&self) -> Vec<String> {
        Vec::new()
    }

    /// The property's last-persisted value.
    ///
    /// Never called for collection-typed properties; the capture engine
    /// substitutes a placeholder for those instead of asking, because prior
    /// collection contents are not recoverable from dirty tracking.
    fn prior_value(&self, property: &str) -> ChronicleResult<serde_json::Value>;

    /// The property's current in-memory value.
    fn current_value(&self, property: &str) -> ChronicleResult<serde_json::Value>;

    /// The entity's identifier, if one has been assigned.
    fn identifier(&self) -> Option<serde_json::Value>;

    /// Probe for an insert callback.  Default: none.
    fn save_handler(&self) -> Option<&dyn SaveHandler> {
        None
    }

    /// Probe for a delete callback.  Default: none.
    fn delete_handler(&self) -> Option<&dyn DeleteHandler> {
        None
    }

    /// Probe for a change callback of either arity.  Default: none.
    fn change_handler(&self) -> Option<ChangeHandlers<'_>> {
        None
    }
}

/// The durable destination for audit records.
///
/// `append` stamps `created_at` and persists using a storage context
/// independent of the triggering operation, so a rollback of the business
/// transaction does not discard the audit trail written alongside it.
/// Implementations return `ChronicleError::SinkWrite` on failure; the
/// capture engine logs and absorbs that error — it is never retried and
/// never propagates to the business operation.
pub trait AuditSink: Send + Sync {
    fn append(&self, record: &AuditRecord) -> ChronicleResult<()>;
}
