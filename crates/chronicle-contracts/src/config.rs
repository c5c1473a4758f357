//! Process-wide audit configuration.
//!
//! An `AuditConfig` is built once at startup — deserialized from the
//! `[settings]` table of a policy TOML document or constructed in code —
//! and is read-only thereafter.  It is shared across threads behind an
//! `Arc` with no further synchronization.

use serde::{Deserialize, Serialize};

/// One literal-text substitution applied to rendered values.
///
/// Patterns are applied in declaration order; `find` is plain text, not a
/// regular expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplacementPattern {
    /// The literal text to search for.
    pub find: String,
    /// The text substituted for every occurrence of `find`.
    pub replace: String,
}

/// Global audit settings with per-entity declarations layered on top.
///
/// Every field has a serde default so a partial `[settings]` table — or no
/// table at all — yields a working configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// When true, insert and delete log every property individually rather
    /// than a single marker record.
    pub verbose: bool,

    /// When true, rendered collection/reference values are annotated with
    /// `[id:<identifier>]` prefixes where an identifier is resolvable.
    pub log_identifiers: bool,

    /// When true, sinks wrap each persist in an explicit durability
    /// boundary (e.g. fsync per append for file-backed sinks).
    pub transactional: bool,

    /// Hard character-count cut applied to every rendered value.
    /// `None` means unlimited.
    pub truncate_length: Option<usize>,

    /// Session attribute consulted by the default actor strategy.
    pub session_attribute_key: Option<String>,

    /// Dotted path into request attributes consulted by the default actor
    /// strategy, e.g. `"security.principal.name"`.
    pub actor_attribute_key: Option<String>,

    /// The literal substituted for masked property values.
    pub property_mask: String,

    /// Identity attributed to a change when no strategy resolves one.
    pub default_actor: String,

    /// Global include list merged with each entity's declared include list.
    /// Empty means "no restriction".
    pub default_include: Vec<String>,

    /// Global exclude list merged with each entity's declared exclude list.
    pub default_exclude: Vec<String>,

    /// Global mask list.  A per-entity mask list overrides this entirely —
    /// the two are never merged.
    pub default_mask: Vec<String>,

    /// Literal substitutions applied, in order, to every rendered value.
    pub replacement_patterns: Vec<ReplacementPattern>,

    /// When true, forces handlers-only mode for every entity: callbacks
    /// still fire but no records are persisted.
    pub handlers_only: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            log_identifiers: false,
            transactional: false,
            truncate_length: None,
            session_attribute_key: None,
            actor_attribute_key: None,
            property_mask: "**********".to_string(),
            default_actor: "system".to_string(),
            default_include: Vec::new(),
            default_exclude: Vec::new(),
            default_mask: vec!["password".to_string()],
            replacement_patterns: Vec::new(),
            handlers_only: false,
        }
    }
}
