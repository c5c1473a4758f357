//! Per-entity-class audit declarations.
//!
//! An `AuditDeclaration` is the typed form of an entity's static audit
//! settings.  Entity types register their declaration explicitly with the
//! policy registry — there is no runtime reflection over entity classes.
//! In TOML a declaration appears as an `[entities.<ClassName>]` table.

use serde::{Deserialize, Serialize};

/// Static audit settings declared by one entity class.
///
/// Example in TOML:
/// ```toml
/// [entities.Account]
/// auditable = true
/// exclude = ["version"]
/// mask = ["password", "pin"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditDeclaration {
    /// Whether changes to this class are recorded at all.  Defaults to true
    /// so that merely declaring a class opts it in.
    pub auditable: bool,

    /// Properties eligible for auditing.  Empty means "no restriction": all
    /// non-excluded properties qualify.  This must never be read as
    /// "nothing included".
    pub include: Vec<String>,

    /// Properties never audited, removed before the include filter applies.
    pub exclude: Vec<String>,

    /// Properties whose values are replaced by the configured mask literal.
    /// `None` inherits the global default mask list; `Some` overrides it
    /// entirely — the two lists are never merged.
    pub mask: Option<Vec<String>>,

    /// When true, entity callbacks still fire but no records are persisted
    /// for this class.
    pub handlers_only: bool,
}

impl Default for AuditDeclaration {
    fn default() -> Self {
        Self {
            auditable: true,
            include: Vec::new(),
            exclude: Vec::new(),
            mask: None,
            handlers_only: false,
        }
    }
}

impl AuditDeclaration {
    /// A declaration that audits everything with default settings — the
    /// typed equivalent of declaring `auditable = true` and nothing else.
    pub fn auditable() -> Self {
        Self::default()
    }

    /// A declaration that opts the class out of auditing entirely.
    pub fn disabled() -> Self {
        Self { auditable: false, ..Self::default() }
    }
}
