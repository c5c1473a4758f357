//! The policy registry: declaration lookup merged with global defaults.
//!
//! `AuditPolicy` answers the three questions the capture engine asks for
//! every lifecycle event: is this class auditable, which of its properties
//! qualify, and which of those are masked.  Declarations are registered
//! explicitly (in code or from a TOML document) and the registry is
//! read-only once handed to the engine, so concurrent lookups need no
//! synchronization.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use chronicle_contracts::{
    config::AuditConfig,
    error::{ChronicleError, ChronicleResult},
};

use crate::declaration::AuditDeclaration;

/// The top-level structure deserialized from a policy TOML file.
///
/// Example:
/// ```toml
/// [settings]
/// verbose = true
/// truncate_length = 255
///
/// [entities.Account]
/// exclude = ["version"]
///
/// [entities.Session]
/// auditable = false
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PolicyDocument {
    /// Global settings.  Missing table yields `AuditConfig::default()`.
    pub settings: AuditConfig,

    /// Per-class declarations keyed by entity class name.
    pub entities: BTreeMap<String, AuditDeclaration>,
}

/// Per-entity-class audit policy lookup with global defaults as fallback.
#[derive(Debug, Clone)]
pub struct AuditPolicy {
    config: Arc<AuditConfig>,
    declarations: BTreeMap<String, AuditDeclaration>,
}

impl AuditPolicy {
    /// Build an empty registry over the given global configuration.
    pub fn new(config: Arc<AuditConfig>) -> Self {
        Self { config, declarations: BTreeMap::new() }
    }

    /// Parse `s` as a TOML policy document and build the registry.
    ///
    /// Returns `ChronicleError::ConfigError` if the TOML is malformed or
    /// does not match the `PolicyDocument` schema.
    pub fn from_toml_str(s: &str) -> ChronicleResult<Self> {
        let document: PolicyDocument =
            toml::from_str(s).map_err(|e| ChronicleError::ConfigError {
                reason: format!("failed to parse policy TOML: {}", e),
            })?;
        Ok(Self::from_document(document))
    }

    /// Read the file at `path` and parse it as a TOML policy document.
    pub fn from_file(path: &Path) -> ChronicleResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ChronicleError::ConfigError {
            reason: format!("failed to read policy file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Build a registry from an already-parsed document.
    pub fn from_document(document: PolicyDocument) -> Self {
        let mut policy = Self::new(Arc::new(document.settings));
        for (class, declaration) in document.entities {
            policy.declare(class, declaration);
        }
        policy
    }

    /// Register (or replace) the declaration for one entity class.
    pub fn declare(&mut self, entity_class: impl Into<String>, declaration: AuditDeclaration) {
        let entity_class = entity_class.into();
        debug!(entity_class = %entity_class, "registering audit declaration");
        self.declarations.insert(entity_class, declaration);
    }

    /// The global configuration this registry was built over.
    pub fn config(&self) -> &Arc<AuditConfig> {
        &self.config
    }

    /// True only if the class registered a declaration with `auditable = true`.
    ///
    /// An unknown class is never auditable — auditing is strictly opt-in.
    pub fn is_auditable(&self, entity_class: &str) -> bool {
        self.declarations
            .get(entity_class)
            .map(|d| d.auditable)
            .unwrap_or(false)
    }

    /// Filter `candidates` down to the class's effective auditable set.
    ///
    /// Algorithm: remove every name in (class excludes ∪ global default
    /// excludes); then, if (class includes ∪ global default includes) is
    /// non-empty, intersect with it.  An empty include union means "no
    /// restriction" — all remaining candidates qualify.
    pub fn effective_properties<I, S>(&self, entity_class: &str, candidates: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let declaration = self.declarations.get(entity_class);

        let excluded: BTreeSet<&str> = declaration
            .map(|d| d.exclude.iter().map(String::as_str))
            .into_iter()
            .flatten()
            .chain(self.config.default_exclude.iter().map(String::as_str))
            .collect();

        let included: BTreeSet<&str> = declaration
            .map(|d| d.include.iter().map(String::as_str))
            .into_iter()
            .flatten()
            .chain(self.config.default_include.iter().map(String::as_str))
            .collect();

        candidates
            .into_iter()
            .map(Into::into)
            .filter(|name| !excluded.contains(name.as_str()))
            .filter(|name| included.is_empty() || included.contains(name.as_str()))
            .collect()
    }

    /// The mask list in effect for the class.
    ///
    /// A class-declared list overrides the global default entirely; the two
    /// are never merged.
    pub fn mask_list(&self, entity_class: &str) -> BTreeSet<String> {
        let declared = self.declarations.get(entity_class).and_then(|d| d.mask.as_ref());
        match declared {
            Some(mask) => mask.iter().cloned().collect(),
            None => self.config.default_mask.iter().cloned().collect(),
        }
    }

    /// Whether the class suppresses record persistence while still firing
    /// callbacks.  The global flag, when set, forces true for every class.
    pub fn handlers_only(&self, entity_class: &str) -> bool {
        if self.config.handlers_only {
            return true;
        }
        self.declarations
            .get(entity_class)
            .map(|d| d.handlers_only)
            .unwrap_or(false)
    }
}
