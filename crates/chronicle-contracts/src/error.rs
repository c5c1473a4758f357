//! Runtime error types for the Chronicle audit pipeline.
//!
//! Every failure class in the audit path is local-recovery-only: the capture
//! engine logs and absorbs these errors rather than propagating them into
//! the business operation that triggered auditing.  Nothing in this core is
//! fatal — every failure degrades to "this one audit entry is missing".

use thiserror::Error;

/// The unified error type for the Chronicle runtime.
#[derive(Debug, Error)]
pub enum ChronicleError {
    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// The configured actor resolution strategy threw.  The resolver
    /// disables the strategy for the remainder of the process lifetime and
    /// substitutes the default actor.
    #[error("actor resolution failed: {reason}")]
    ActorResolution { reason: String },

    /// Computing or emitting diffs for one entity event failed.  The event
    /// is abandoned for that entity; no record is emitted.
    #[error("audit event processing failed for '{entity_class}': {reason}")]
    EventProcessing { entity_class: String, reason: String },

    /// The sink could not persist a record.  The record is lost — there is
    /// no retry and no dead-letter queue.
    #[error("audit sink write failed: {reason}")]
    SinkWrite { reason: String },
}

/// Convenience alias used throughout the Chronicle crates.
pub type ChronicleResult<T> = Result<T, ChronicleError>;
