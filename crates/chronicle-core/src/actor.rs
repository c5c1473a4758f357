//! Actor resolution: attributing an identity string to each change.
//!
//! The resolver consults a pluggable [`ActorStrategy`] against an explicit
//! [`RequestContext`] — there is no ambient "current request" global.  A
//! strategy that fails is permanently disabled for the remainder of the
//! process lifetime (fail-once semantics): a broken strategy is not
//! retried on every event, and the configured default actor is substituted
//! from then on.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, warn};

use chronicle_contracts::{config::AuditConfig, error::ChronicleResult};

/// The fallback identity when nothing else is configured or resolvable.
pub const FALLBACK_ACTOR: &str = "system";

/// A snapshot of the request/session state active when a change occurred.
///
/// Built by the hosting application and passed into the capture engine per
/// event; `None` when no request is in flight (background jobs, bootstrap).
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// The request URI, recorded on every audit record as `source_uri`.
    pub uri: Option<String>,

    /// The transport-level remote user identity, when authenticated.
    pub remote_user: Option<String>,

    /// The authenticated principal's name, when a security layer is present.
    pub principal_name: Option<String>,

    /// Session attributes as a flat map.
    pub session_attributes: BTreeMap<String, serde_json::Value>,

    /// Request attributes as a flat map; values may nest further objects,
    /// which the dotted-path lookup walks.
    pub request_attributes: BTreeMap<String, serde_json::Value>,
}

/// A pluggable actor resolution strategy.
///
/// `Ok(None)` means "this context carries no identity" and is not a
/// failure; the resolver falls back to the default actor without disabling
/// the strategy.  `Err` disables the strategy permanently.
pub trait ActorStrategy: Send + Sync {
    fn resolve(&self, context: &RequestContext) -> ChronicleResult<Option<String>>;
}

/// The default resolution chain, in order:
///
/// 1. the remote user identity from the request,
/// 2. the authenticated principal name,
/// 3. a named session attribute (`session_attribute_key`),
/// 4. a dotted-path lookup into request attributes (`actor_attribute_key`).
///
/// Every step is best-effort and null-tolerant; a failed dotted-path
/// segment aborts that attempt (logged, not raised) and falls through.
#[derive(Debug, Clone, Default)]
pub struct DefaultActorStrategy {
    /// Session attribute name consulted at step 3.
    pub session_attribute_key: Option<String>,

    /// Dotted path walked at step 4, e.g. `"security.principal.name"`.
    pub actor_attribute_key: Option<String>,
}

impl DefaultActorStrategy {
    /// Build the strategy from the configured lookup keys
    /// (`session_attribute_key`, `actor_attribute_key`).
    pub fn from_config(config: &AuditConfig) -> Self {
        Self {
            session_attribute_key: config.session_attribute_key.clone(),
            actor_attribute_key: config.actor_attribute_key.clone(),
        }
    }

    /// Walk a pre-split dotted path through nested JSON objects, returning
    /// `None` the moment any segment is missing or the value stops being an
    /// object.
    fn dotted_lookup(attributes: &BTreeMap<String, serde_json::Value>, path: &str) -> Option<String> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = attributes.get(first)?;

        for segment in segments {
            match current.get(segment) {
                Some(next) => current = next,
                None => {
                    debug!(path = %path, segment = %segment, "dotted actor lookup dead-ends");
                    return None;
                }
            }
        }

        value_to_actor(current)
    }
}

impl ActorStrategy for DefaultActorStrategy {
    fn resolve(&self, context: &RequestContext) -> ChronicleResult<Option<String>> {
        if let Some(user) = &context.remote_user {
            return Ok(Some(user.clone()));
        }
        if let Some(principal) = &context.principal_name {
            return Ok(Some(principal.clone()));
        }
        if let Some(key) = &self.session_attribute_key {
            if let Some(actor) = context.session_attributes.get(key).and_then(value_to_actor) {
                return Ok(Some(actor));
            }
        }
        if let Some(path) = &self.actor_attribute_key {
            if let Some(actor) = Self::dotted_lookup(&context.request_attributes, path) {
                return Ok(Some(actor));
            }
        }
        Ok(None)
    }
}

/// Stringify a JSON value into an actor name.  Strings are used verbatim
/// (no surrounding quotes); null yields nothing; other scalars use their
/// JSON form.
fn value_to_actor(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Produces the identity string attributed to each change.
///
/// # Thread safety
///
/// `resolve` takes `&self`; the only mutable state is the `disabled` flag,
/// an `AtomicBool` whose set is idempotent.  Concurrent failures racing to
/// disable the strategy are harmless — last write wins.
pub struct ActorResolver {
    strategy: Option<Box<dyn ActorStrategy>>,
    disabled: AtomicBool,
    default_actor: String,
}

impl ActorResolver {
    /// A resolver with no strategy: every call returns the default actor.
    pub fn fixed(default_actor: impl Into<String>) -> Self {
        Self {
            strategy: None,
            disabled: AtomicBool::new(false),
            default_actor: non_empty_or_fallback(default_actor.into()),
        }
    }

    /// A resolver that consults `strategy`, falling back to `default_actor`.
    pub fn with_strategy(strategy: Box<dyn ActorStrategy>, default_actor: impl Into<String>) -> Self {
        Self {
            strategy: Some(strategy),
            disabled: AtomicBool::new(false),
            default_actor: non_empty_or_fallback(default_actor.into()),
        }
    }

    /// A resolver wired entirely from configuration: the default strategy
    /// built from the configured lookup keys, falling back to the
    /// configured default actor.
    pub fn from_config(config: &AuditConfig) -> Self {
        Self::with_strategy(
            Box::new(DefaultActorStrategy::from_config(config)),
            config.default_actor.clone(),
        )
    }

    /// The identity used when the strategy resolves nothing.
    pub fn default_actor(&self) -> &str {
        &self.default_actor
    }

    /// True once a strategy failure has permanently disabled resolution.
    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::Relaxed)
    }

    /// Resolve the actor for one change.
    ///
    /// Returns the default actor when no strategy is configured, no context
    /// is active, the strategy has been disabled by an earlier failure, or
    /// the strategy resolves nothing.  A strategy error is logged, disables
    /// the strategy for the rest of the process lifetime, and yields the
    /// default actor for that call and every subsequent one.
    pub fn resolve(&self, context: Option<&RequestContext>) -> String {
        let (strategy, context) = match (&self.strategy, context) {
            (Some(strategy), Some(context)) => (strategy, context),
            _ => return self.default_actor.clone(),
        };

        if self.disabled.load(Ordering::Relaxed) {
            return self.default_actor.clone();
        }

        match strategy.resolve(context) {
            Ok(Some(actor)) => actor,
            Ok(None) => self.default_actor.clone(),
            Err(e) => {
                warn!(
                    error = %e,
                    default_actor = %self.default_actor,
                    "actor strategy failed; disabling it for the process lifetime"
                );
                self.disabled.store(true, Ordering::Relaxed);
                self.default_actor.clone()
            }
        }
    }
}

fn non_empty_or_fallback(actor: String) -> String {
    if actor.is_empty() {
        FALLBACK_ACTOR.to_string()
    } else {
        actor
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use serde_json::json;

    use chronicle_contracts::error::{ChronicleError, ChronicleResult};

    use super::*;

    /// A strategy that fails every call and counts how often it is invoked.
    struct ExplodingStrategy {
        calls: Arc<AtomicUsize>,
    }

    impl ActorStrategy for ExplodingStrategy {
        fn resolve(&self, _context: &RequestContext) -> ChronicleResult<Option<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(ChronicleError::ActorResolution { reason: "boom".to_string() })
        }
    }

    fn ctx() -> RequestContext {
        RequestContext::default()
    }

    #[test]
    fn no_strategy_returns_default() {
        let resolver = ActorResolver::fixed("batch");
        assert_eq!(resolver.resolve(Some(&ctx())), "batch");
        assert_eq!(resolver.resolve(None), "batch");
    }

    #[test]
    fn empty_default_falls_back_to_system_literal() {
        let resolver = ActorResolver::fixed("");
        assert_eq!(resolver.resolve(None), "system");
    }

    #[test]
    fn no_context_skips_strategy_without_disabling() {
        let resolver = ActorResolver::with_strategy(
            Box::new(ExplodingStrategy { calls: Arc::new(AtomicUsize::new(0)) }),
            "system",
        );
        assert_eq!(resolver.resolve(None), "system");
        assert!(!resolver.is_disabled());
    }

    /// A failing strategy is disabled on first failure and never retried:
    /// the invocation count stays at 1 across subsequent resolves.
    #[test]
    fn failed_strategy_is_not_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let resolver = ActorResolver::with_strategy(
            Box::new(ExplodingStrategy { calls: Arc::clone(&calls) }),
            "system",
        );

        assert_eq!(resolver.resolve(Some(&ctx())), "system");
        assert!(resolver.is_disabled());

        // Subsequent calls still return the default without touching the
        // strategy again.
        assert_eq!(resolver.resolve(Some(&ctx())), "system");
        assert_eq!(resolver.resolve(Some(&ctx())), "system");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn default_strategy_prefers_remote_user() {
        let strategy = DefaultActorStrategy::default();
        let context = RequestContext {
            remote_user: Some("alice".into()),
            principal_name: Some("ignored".into()),
            ..ctx()
        };
        assert_eq!(strategy.resolve(&context).unwrap(), Some("alice".to_string()));
    }

    #[test]
    fn default_strategy_falls_back_to_principal() {
        let strategy = DefaultActorStrategy::default();
        let context = RequestContext { principal_name: Some("bob".into()), ..ctx() };
        assert_eq!(strategy.resolve(&context).unwrap(), Some("bob".to_string()));
    }

    #[test]
    fn default_strategy_reads_session_attribute() {
        let strategy = DefaultActorStrategy {
            session_attribute_key: Some("user".into()),
            actor_attribute_key: None,
        };
        let mut context = ctx();
        context.session_attributes.insert("user".into(), json!("carol"));
        assert_eq!(strategy.resolve(&context).unwrap(), Some("carol".to_string()));
    }

    #[test]
    fn dotted_path_walks_nested_request_attributes() {
        let strategy = DefaultActorStrategy {
            session_attribute_key: None,
            actor_attribute_key: Some("security.principal.name".into()),
        };
        let mut context = ctx();
        context.request_attributes.insert(
            "security".into(),
            json!({ "principal": { "name": "dave" } }),
        );
        assert_eq!(strategy.resolve(&context).unwrap(), Some("dave".to_string()));
    }

    /// A missing segment mid-path aborts the attempt and resolves nothing.
    #[test]
    fn dotted_path_dead_end_falls_through() {
        let strategy = DefaultActorStrategy {
            session_attribute_key: None,
            actor_attribute_key: Some("security.principal.name".into()),
        };
        let mut context = ctx();
        context
            .request_attributes
            .insert("security".into(), json!({ "other": true }));
        assert_eq!(strategy.resolve(&context).unwrap(), None);
    }

    /// A resolver built from configuration honors the configured lookup
    /// keys and default actor rather than ignoring them.
    #[test]
    fn from_config_wires_lookup_keys_and_default_actor() {
        let config = AuditConfig {
            session_attribute_key: Some("login".to_string()),
            actor_attribute_key: Some("security.principal.name".to_string()),
            default_actor: "batch-job".to_string(),
            ..AuditConfig::default()
        };
        let resolver = ActorResolver::from_config(&config);

        let mut context = ctx();
        context.session_attributes.insert("login".into(), json!("carol"));
        assert_eq!(resolver.resolve(Some(&context)), "carol");

        let mut nested = ctx();
        nested.request_attributes.insert(
            "security".into(),
            json!({ "principal": { "name": "dave" } }),
        );
        assert_eq!(resolver.resolve(Some(&nested)), "dave");

        // Nothing resolvable — the configured default applies, not "system".
        assert_eq!(resolver.resolve(Some(&ctx())), "batch-job");
        assert_eq!(resolver.resolve(None), "batch-job");
    }

    #[test]
    fn empty_context_resolves_nothing() {
        let strategy = DefaultActorStrategy {
            session_attribute_key: Some("user".into()),
            actor_attribute_key: Some("a.b".into()),
        };
        assert_eq!(strategy.resolve(&ctx()).unwrap(), None);
    }
}
