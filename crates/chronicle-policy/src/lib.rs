//! # chronicle-policy
//!
//! Per-entity audit declarations and TOML-driven policy lookup for the
//! Chronicle audit engine.
//!
//! ## Overview
//!
//! Entity classes opt in to auditing by registering an [`AuditDeclaration`]
//! with an [`AuditPolicy`] registry — either in code via
//! [`AuditPolicy::declare`] or from a TOML document via
//! [`AuditPolicy::from_toml_str`] / [`AuditPolicy::from_file`].  The
//! registry merges each declaration with the global defaults in
//! `AuditConfig` and answers the capture engine's lookups: auditable,
//! effective property set, mask list, handlers-only.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use chronicle_policy::AuditPolicy;
//!
//! let policy = AuditPolicy::from_file(Path::new("audit.toml"))?;
//! // Pass `policy` to `chronicle_core::ChangeCapture::new(...)`.
//! ```

pub mod declaration;
pub mod registry;

pub use declaration::AuditDeclaration;
pub use registry::{AuditPolicy, PolicyDocument};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;

    use chronicle_contracts::config::AuditConfig;

    use crate::{AuditDeclaration, AuditPolicy};

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn policy_with(config: AuditConfig) -> AuditPolicy {
        AuditPolicy::new(Arc::new(config))
    }

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    // ── 1. auditable lookup ───────────────────────────────────────────────────

    /// A class with no declaration is never auditable.
    #[test]
    fn test_unknown_class_not_auditable() {
        let policy = policy_with(AuditConfig::default());
        assert!(!policy.is_auditable("Account"));
    }

    /// Registering a default declaration opts the class in.
    #[test]
    fn test_declared_class_is_auditable() {
        let mut policy = policy_with(AuditConfig::default());
        policy.declare("Account", AuditDeclaration::auditable());
        assert!(policy.is_auditable("Account"));
    }

    /// An explicit `auditable = false` declaration opts the class out.
    #[test]
    fn test_disabled_declaration() {
        let mut policy = policy_with(AuditConfig::default());
        policy.declare("Session", AuditDeclaration::disabled());
        assert!(!policy.is_auditable("Session"));
    }

    // ── 2. effective properties ───────────────────────────────────────────────

    /// With no include/exclude anywhere, every candidate qualifies.
    #[test]
    fn test_effective_properties_no_restriction() {
        let mut policy = policy_with(AuditConfig::default());
        policy.declare("Account", AuditDeclaration::auditable());

        let effective = policy.effective_properties("Account", ["name", "age"]);
        assert_eq!(effective, set(&["name", "age"]));
    }

    /// Class-declared excludes remove candidates.
    #[test]
    fn test_exclude_removes_properties() {
        let mut policy = policy_with(AuditConfig::default());
        policy.declare(
            "Account",
            AuditDeclaration { exclude: vec!["version".into()], ..AuditDeclaration::auditable() },
        );

        let effective = policy.effective_properties("Account", ["name", "version"]);
        assert_eq!(effective, set(&["name"]));
    }

    /// A non-empty include list restricts to exactly those names.
    #[test]
    fn test_include_restricts_properties() {
        let mut policy = policy_with(AuditConfig::default());
        policy.declare(
            "Account",
            AuditDeclaration { include: vec!["name".into()], ..AuditDeclaration::auditable() },
        );

        let effective = policy.effective_properties("Account", ["name", "age"]);
        assert_eq!(effective, set(&["name"]));
    }

    /// An empty include list means "no restriction", never "nothing included".
    #[test]
    fn test_empty_include_is_no_restriction() {
        let mut policy = policy_with(AuditConfig::default());
        policy.declare(
            "Account",
            AuditDeclaration { include: Vec::new(), ..AuditDeclaration::auditable() },
        );

        let effective = policy.effective_properties("Account", ["name", "age"]);
        assert_eq!(effective.len(), 2);
    }

    /// Global default excludes apply on top of class-declared excludes, and
    /// exclusion wins over inclusion.
    #[test]
    fn test_global_defaults_merge_with_declaration() {
        let config = AuditConfig {
            default_exclude: vec!["last_updated".into()],
            default_include: vec!["name".into(), "last_updated".into()],
            ..AuditConfig::default()
        };
        let mut policy = policy_with(config);
        policy.declare("Account", AuditDeclaration::auditable());

        let effective =
            policy.effective_properties("Account", ["name", "age", "last_updated"]);
        assert_eq!(effective, set(&["name"]));
    }

    // ── 3. mask list ──────────────────────────────────────────────────────────

    /// Without a class-declared mask list, the global default applies.
    #[test]
    fn test_mask_list_falls_back_to_default() {
        let mut policy = policy_with(AuditConfig::default());
        policy.declare("Account", AuditDeclaration::auditable());
        assert_eq!(policy.mask_list("Account"), set(&["password"]));
    }

    /// A class-declared mask list replaces the default entirely, even when
    /// the declared list omits names the default carries.
    #[test]
    fn test_mask_list_override_not_merge() {
        let mut policy = policy_with(AuditConfig::default());
        policy.declare(
            "Account",
            AuditDeclaration { mask: Some(vec!["pin".into()]), ..AuditDeclaration::auditable() },
        );

        let masks = policy.mask_list("Account");
        assert_eq!(masks, set(&["pin"]));
        assert!(!masks.contains("password"), "override must not merge the default");
    }

    /// An explicitly empty declared mask list disables masking for the class.
    #[test]
    fn test_empty_declared_mask_list_disables_masking() {
        let mut policy = policy_with(AuditConfig::default());
        policy.declare(
            "Account",
            AuditDeclaration { mask: Some(Vec::new()), ..AuditDeclaration::auditable() },
        );
        assert!(policy.mask_list("Account").is_empty());
    }

    // ── 4. handlers-only ──────────────────────────────────────────────────────

    /// The global flag forces handlers-only for every class, declared or not.
    #[test]
    fn test_global_handlers_only_forces_true() {
        let config = AuditConfig { handlers_only: true, ..AuditConfig::default() };
        let mut policy = policy_with(config);
        policy.declare("Account", AuditDeclaration::auditable());

        assert!(policy.handlers_only("Account"));
        assert!(policy.handlers_only("Undeclared"));
    }

    /// Without the global flag, the per-class declaration decides.
    #[test]
    fn test_per_class_handlers_only() {
        let mut policy = policy_with(AuditConfig::default());
        policy.declare(
            "Account",
            AuditDeclaration { handlers_only: true, ..AuditDeclaration::auditable() },
        );
        policy.declare("Invoice", AuditDeclaration::auditable());

        assert!(policy.handlers_only("Account"));
        assert!(!policy.handlers_only("Invoice"));
    }

    // ── 5. TOML loading ───────────────────────────────────────────────────────

    /// A full document populates settings and per-class declarations.
    #[test]
    fn test_from_toml_document() {
        let toml = r#"
            [settings]
            verbose = true
            truncate_length = 255
            default_mask = ["password", "secret"]

            [entities.Account]
            exclude = ["version"]
            mask = ["pin"]

            [entities.Session]
            auditable = false
        "#;

        let policy = AuditPolicy::from_toml_str(toml).unwrap();

        assert!(policy.config().verbose);
        assert_eq!(policy.config().truncate_length, Some(255));
        assert!(policy.is_auditable("Account"));
        assert!(!policy.is_auditable("Session"));
        assert_eq!(policy.mask_list("Account"), set(&["pin"]));
        // Undeclared mask falls back to the document's default list.
        let mut session_policy = policy.clone();
        session_policy.declare("Invoice", crate::AuditDeclaration::auditable());
        assert_eq!(session_policy.mask_list("Invoice"), set(&["password", "secret"]));
    }

    /// An empty document is valid: default settings, no declarations.
    #[test]
    fn test_empty_toml_document() {
        let policy = AuditPolicy::from_toml_str("").unwrap();
        assert!(!policy.is_auditable("Anything"));
        assert_eq!(policy.config().default_actor, "system");
    }

    /// Malformed TOML must produce a `ChronicleError::ConfigError`.
    #[test]
    fn test_toml_parse_error() {
        let result = AuditPolicy::from_toml_str("this is not valid toml ][[[");
        match result {
            Err(chronicle_contracts::error::ChronicleError::ConfigError { reason }) => {
                assert!(
                    reason.contains("failed to parse policy TOML"),
                    "expected parse error message, got: {reason}"
                );
            }
            other => panic!("expected ConfigError, got {:?}", other.map(|_| ())),
        }
    }
}
