//! # chronicle-contracts
//!
//! Shared types, configuration, and error contracts for the Chronicle
//! entity-change auditing engine.
//!
//! All crates in the workspace import from here.  No business logic lives in
//! this crate — only data definitions, configuration, and error types.

pub mod change;
pub mod config;
pub mod error;
pub mod record;

pub use change::ChangeSet;
pub use config::{AuditConfig, ReplacementPattern};
pub use error::{ChronicleError, ChronicleResult};
pub use record::{AuditRecord, EventKind, ValueMap};
