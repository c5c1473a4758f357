//! The change-capture engine: lifecycle events in, audit records out.
//!
//! `ChangeCapture` drives one pass per lifecycle event:
//!
//!   received → filtered (policy) → diffed (old/new maps) → emitted (sink)
//!
//! with an absorbing error path from every step: any failure while
//! processing one entity's event is caught at the public entry point,
//! logged with the entity class name, and swallowed.  An audit failure
//! must never propagate to fail the triggering business operation or
//! block processing of other entities.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use chronicle_contracts::{
    change::ChangeSet,
    config::AuditConfig,
    error::ChronicleResult,
    record::{AuditRecord, EventKind, ValueMap},
};
use chronicle_policy::AuditPolicy;

use crate::actor::{ActorResolver, RequestContext};
use crate::format::ValueFormatter;
use crate::traits::{AuditSink, ChangeHandlers, EntityAdapter};

/// The literal recorded in place of a collection property's prior value.
///
/// Prior collection contents are not recoverable once the engine has
/// flagged the collection dirty (update) or queued the owner for deletion
/// (delete), so the placeholder is recorded instead.  This is a documented
/// caveat of the capture model, not an optional shortcut.
pub const COLLECTION_PLACEHOLDER: &str = "N/A";

/// The engine that turns entity lifecycle events into audit records.
///
/// Construct one per process and share it behind an `Arc`; every method
/// takes `&self` and the engine holds no per-event state.
pub struct ChangeCapture {
    policy: AuditPolicy,
    config: Arc<AuditConfig>,
    formatter: ValueFormatter,
    actor: ActorResolver,
    sink: Box<dyn AuditSink>,
}

impl ChangeCapture {
    /// Wire the engine from its trusted collaborators.
    ///
    /// The formatter is derived from the policy's global configuration so
    /// rendering and filtering can never disagree about settings.
    pub fn new(policy: AuditPolicy, actor: ActorResolver, sink: Box<dyn AuditSink>) -> Self {
        let config = Arc::clone(policy.config());
        let formatter = ValueFormatter::new(Arc::clone(&config));
        Self { policy, config, formatter, actor, sink }
    }

    // ── Lifecycle entry points ────────────────────────────────────────────────

    /// Handle an entity insert, after the engine has persisted it.
    pub fn after_insert(&self, entity: &dyn EntityAdapter, context: Option<&RequestContext>) {
        if let Err(e) = self.handle_insert(entity, context) {
            warn!(
                entity_class = %entity.entity_class(),
                error = %e,
                "audit processing failed for insert; event abandoned"
            );
        }
    }

    /// Handle an entity update, before the engine flushes the new state.
    pub fn before_update(&self, entity: &dyn EntityAdapter, context: Option<&RequestContext>) {
        if let Err(e) = self.handle_update(entity, context) {
            warn!(
                entity_class = %entity.entity_class(),
                error = %e,
                "audit processing failed for update; event abandoned"
            );
        }
    }

    /// Handle an entity delete.  Must run before the deletion removes the
    /// entity's prior state — this is the read-before-write ordering the
    /// persistence engine is required to honor.
    pub fn before_delete(&self, entity: &dyn EntityAdapter, context: Option<&RequestContext>) {
        if let Err(e) = self.handle_delete(entity, context) {
            warn!(
                entity_class = %entity.entity_class(),
                error = %e,
                "audit processing failed for delete; event abandoned"
            );
        }
    }

    // ── Event handling ────────────────────────────────────────────────────────

    fn handle_insert(
        &self,
        entity: &dyn EntityAdapter,
        context: Option<&RequestContext>,
    ) -> ChronicleResult<()> {
        let class = entity.entity_class().to_string();
        if !self.policy.is_auditable(&class) {
            debug!(entity_class = %class, "class not auditable; skipping insert");
            return Ok(());
        }

        let properties = self.policy.effective_properties(&class, entity.persistent_properties());

        let mut new_values = ValueMap::new();
        for property in &properties {
            new_values.insert(property.clone(), entity.current_value(property)?);
        }

        let change = ChangeSet {
            entity_class: class.clone(),
            entity_id: identifier_string(entity),
            kind: EventKind::Insert,
            old_values: None,
            new_values: Some(new_values.clone()),
        };

        if !self.policy.handlers_only(&class) {
            self.emit(&change, context);
        }

        // The save callback always fires, even in handlers-only mode, and
        // receives the raw (unmasked, unformatted) values.
        if let Some(handler) = entity.save_handler() {
            handler.on_save(&new_values);
        }

        Ok(())
    }

    fn handle_delete(
        &self,
        entity: &dyn EntityAdapter,
        context: Option<&RequestContext>,
    ) -> ChronicleResult<()> {
        let class = entity.entity_class().to_string();
        if !self.policy.is_auditable(&class) {
            debug!(entity_class = %class, "class not auditable; skipping delete");
            return Ok(());
        }

        let properties = self.policy.effective_properties(&class, entity.persistent_properties());

        let mut old_values = ValueMap::new();
        for property in &properties {
            old_values.insert(property.clone(), self.prior_or_placeholder(entity, property)?);
        }

        let change = ChangeSet {
            entity_class: class.clone(),
            entity_id: identifier_string(entity),
            kind: EventKind::Delete,
            old_values: Some(old_values.clone()),
            new_values: None,
        };

        if !self.policy.handlers_only(&class) {
            self.emit(&change, context);
        }

        if let Some(handler) = entity.delete_handler() {
            handler.on_delete(&old_values);
        }

        Ok(())
    }

    fn handle_update(
        &self,
        entity: &dyn EntityAdapter,
        context: Option<&RequestContext>,
    ) -> ChronicleResult<()> {
        let class = entity.entity_class().to_string();
        if !self.policy.is_auditable(&class) {
            debug!(entity_class = %class, "class not auditable; skipping update");
            return Ok(());
        }

        // Reconciliation: a collection can be dirty without appearing in
        // the standard dirty set, so dirty collections are unioned in.
        let dirty: BTreeSet<String> = entity
            .dirty_properties()
            .into_iter()
            .chain(entity.dirty_collections())
            .collect();

        let properties = self.policy.effective_properties(&class, dirty);
        if properties.is_empty() {
            debug!(entity_class = %class, "no auditable dirty properties; skipping update");
            return Ok(());
        }

        let mut old_values = ValueMap::new();
        let mut new_values = ValueMap::new();
        for property in &properties {
            old_values.insert(property.clone(), self.prior_or_placeholder(entity, property)?);
            new_values.insert(property.clone(), entity.current_value(property)?);
        }

        let change = ChangeSet {
            entity_class: class.clone(),
            entity_id: identifier_string(entity),
            kind: EventKind::Update,
            old_values: Some(old_values.clone()),
            new_values: Some(new_values.clone()),
        };

        if !self.policy.handlers_only(&class) {
            self.emit(&change, context);
        }

        // The change callback fires whenever the filtered set is non-empty,
        // in whichever arity the entity type implements.
        match entity.change_handler() {
            Some(ChangeHandlers::TwoArg(handler)) => handler.on_change(&old_values, &new_values),
            Some(ChangeHandlers::SingleArg(handler)) => {
                handler.on_change(&merge_change_maps(&old_values, &new_values))
            }
            None => {}
        }

        Ok(())
    }

    /// Prior value for a property, with the placeholder substituted for
    /// collection-typed properties instead of touching the adapter.
    fn prior_or_placeholder(
        &self,
        entity: &dyn EntityAdapter,
        property: &str,
    ) -> ChronicleResult<Value> {
        if entity.is_collection(property) {
            Ok(Value::String(COLLECTION_PLACEHOLDER.to_string()))
        } else {
            entity.prior_value(property)
        }
    }

    // ── Diff / emit ───────────────────────────────────────────────────────────

    /// Emit the records for one change set.
    ///
    /// - Both maps present (update): one record per property whose raw
    ///   values differ.  Equality uses the raw values, never the rendered
    ///   strings — masking would otherwise hide real differences.
    /// - New only, verbose (insert): one record per property, old `None`.
    /// - Old only, verbose (delete): one record per property, new `None`.
    /// - Otherwise: a single bare marker record.
    ///
    /// A sink failure for one record is logged with the record's
    /// description and the remaining records still go out; the failed
    /// record is lost.
    fn emit(&self, change: &ChangeSet, context: Option<&RequestContext>) {
        let actor = self.actor.resolve(context);
        let source_uri = context.and_then(|c| c.uri.clone());
        let mask_list = self.policy.mask_list(&change.entity_class);

        match (&change.new_values, &change.old_values) {
            (Some(new_values), Some(old_values)) => {
                for (property, new_raw) in new_values {
                    if old_values.get(property) == Some(new_raw) {
                        continue;
                    }
                    let old_raw = old_values.get(property).cloned().unwrap_or(Value::Null);
                    self.append(AuditRecord::property_change(
                        actor.clone(),
                        source_uri.clone(),
                        change.entity_class.clone(),
                        change.kind,
                        change.entity_id.clone(),
                        property.clone(),
                        self.formatter.render(&mask_list, property, &old_raw),
                        self.formatter.render(&mask_list, property, new_raw),
                    ));
                }
            }

            (Some(new_values), None) if self.config.verbose => {
                for (property, new_raw) in new_values {
                    self.append(AuditRecord::property_change(
                        actor.clone(),
                        source_uri.clone(),
                        change.entity_class.clone(),
                        change.kind,
                        change.entity_id.clone(),
                        property.clone(),
                        None,
                        self.formatter.render(&mask_list, property, new_raw),
                    ));
                }
            }

            (None, Some(old_values)) if self.config.verbose => {
                for (property, old_raw) in old_values {
                    self.append(AuditRecord::property_change(
                        actor.clone(),
                        source_uri.clone(),
                        change.entity_class.clone(),
                        change.kind,
                        change.entity_id.clone(),
                        property.clone(),
                        self.formatter.render(&mask_list, property, old_raw),
                        None,
                    ));
                }
            }

            _ => {
                self.append(AuditRecord::marker(
                    actor,
                    source_uri,
                    change.entity_class.clone(),
                    change.kind,
                    change.entity_id.clone(),
                ));
            }
        }
    }

    /// Persist one record, absorbing sink failures.
    fn append(&self, record: AuditRecord) {
        if let Err(e) = self.sink.append(&record) {
            warn!(
                error = %e,
                record = %record.describe(),
                "failed to persist audit record; record lost"
            );
        }
    }
}

/// Render the entity identifier to the string stored on records.
fn identifier_string(entity: &dyn EntityAdapter) -> Option<String> {
    match entity.identifier() {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    }
}

/// Merge old/new maps into the single-argument callback shape:
/// property → `{"old": …, "new": …}`.
fn merge_change_maps(old_values: &ValueMap, new_values: &ValueMap) -> ValueMap {
    new_values
        .iter()
        .map(|(property, new_raw)| {
            let old_raw = old_values.get(property).cloned().unwrap_or(Value::Null);
            (
                property.clone(),
                serde_json::json!({ "old": old_raw, "new": new_raw }),
            )
        })
        .collect()
}
