//! # chronicle-core
//!
//! The change-capture engine for the Chronicle audit pipeline.
//!
//! This crate provides:
//! - The seam traits (`EntityAdapter`, `AuditSink`, and the per-entity
//!   callback capability traits)
//! - `ActorResolver` — attributes an identity string to each change
//! - `ValueFormatter` — renders raw values with masking, replacement,
//!   identifier annotation, and truncation
//! - `ChangeCapture` — turns lifecycle events into per-property audit
//!   records, with failure isolation from the triggering operation
//!
//! ## Usage
//!
//! ```rust,ignore
//! use chronicle_core::{ChangeCapture, ActorResolver};
//!
//! let capture = ChangeCapture::new(policy, ActorResolver::fixed("system"), sink);
//! capture.after_insert(&entity, request_context.as_ref());
//! ```

pub mod actor;
pub mod capture;
pub mod format;
pub mod traits;

pub use actor::{ActorResolver, ActorStrategy, DefaultActorStrategy, RequestContext};
pub use capture::{ChangeCapture, COLLECTION_PLACEHOLDER};
pub use format::ValueFormatter;
pub use traits::{
    AuditSink, ChangeHandler, ChangeHandlers, CombinedChangeHandler, DeleteHandler,
    EntityAdapter, SaveHandler,
};

// ── Tests ─────────────────────────────────────────────────────────────────────
