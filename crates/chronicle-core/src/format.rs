//! Rendering raw field values into loggable strings.
//!
//! `ValueFormatter` is the single place a raw `serde_json::Value` becomes
//! the string stored on an audit record.  Rendering applies, in order:
//! masking, stringification (with optional identifier annotation for
//! collection/reference values), literal replacement patterns, and
//! truncation.  The function is pure given its inputs plus the entity's
//! mask-list policy — no hidden state is touched.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::Value;

use chronicle_contracts::config::AuditConfig;

/// Renders raw property values according to the global configuration.
#[derive(Debug, Clone)]
pub struct ValueFormatter {
    config: Arc<AuditConfig>,
}

impl ValueFormatter {
    pub fn new(config: Arc<AuditConfig>) -> Self {
        Self { config }
    }

    /// Render one property value.
    ///
    /// 1. A masked property renders as the configured mask literal,
    ///    ignoring the actual value entirely — even null.
    /// 2. A null value renders as `None`; no replacement or truncation is
    ///    applied to null.
    /// 3. Otherwise the value is stringified (with `[id:…]` annotation for
    ///    collection/reference values when `log_identifiers` is set), every
    ///    configured replacement pattern is applied in declared order, and
    ///    the result is truncated to `truncate_length` characters.
    pub fn render(
        &self,
        mask_list: &BTreeSet<String>,
        property: &str,
        value: &Value,
    ) -> Option<String> {
        if mask_list.contains(property) {
            return Some(self.config.property_mask.clone());
        }

        if value.is_null() {
            return None;
        }

        let mut rendered = self.stringify(value);

        for pattern in &self.config.replacement_patterns {
            rendered = rendered.replace(&pattern.find, &pattern.replace);
        }

        if let Some(limit) = self.config.truncate_length {
            rendered = truncate_chars(rendered, limit);
        }

        Some(rendered)
    }

    /// Turn a non-null value into its base string form.
    ///
    /// Strings render without surrounding quotes.  Arrays and objects
    /// render as compact JSON unless `log_identifiers` is set, in which
    /// case elements that expose an identifier are annotated.
    fn stringify(&self, value: &Value) -> String {
        match value {
            Value::String(s) => s.clone(),
            Value::Array(elements) if self.config.log_identifiers => elements
                .iter()
                .map(annotate_identifier)
                .collect::<Vec<_>>()
                .join(", "),
            Value::Object(_) if self.config.log_identifiers => annotate_identifier(value),
            other => other.to_string(),
        }
    }
}

/// Render one collection element or reference value, prefixing `[id:<id>]`
/// when the element is an object exposing an `"id"` key.  Elements without
/// a resolvable identifier fall back to their plain string form.
fn annotate_identifier(value: &Value) -> String {
    let plain = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    match value.get("id") {
        Some(Value::Null) | None => plain,
        Some(Value::String(id)) => format!("[id:{}]{}", id, plain),
        Some(id) => format!("[id:{}]{}", id, plain),
    }
}

/// Hard character-count cut; not byte-indexed, not word-aware.
fn truncate_chars(s: String, limit: usize) -> String {
    if s.chars().count() <= limit {
        s
    } else {
        s.chars().take(limit).collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
