//! Error types used by the emitter.
//!
//! The emitter has very few failure modes: most contract violations of the
//! underlying pub/sub model (removing an unknown listener, a malformed
//! bidirectional pattern) are silent no-ops. What remains is captured by
//! [`EmitterError`], which provides `as_label` for logs.

use thiserror::Error;

/// # Errors produced by the emitter.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmitterError {
    /// The coordinator task is gone (explicit shutdown or runtime dropped).
    #[error("emitter closed")]
    Closed,

    /// Command queue is full (try again later or use async `emit`).
    #[error("emitter command queue full")]
    Full,

    /// A typed pattern (`Glob` / `Regex`) failed to compile.
    #[error("invalid pattern {pattern:?}: {reason}")]
    InvalidPattern {
        /// Pattern source as supplied by the caller.
        pattern: String,
        /// Compiler diagnostic.
        reason: String,
    },
}

impl EmitterError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use eventvisor::EmitterError;
    ///
    /// assert_eq!(EmitterError::Closed.as_label(), "emitter_closed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            EmitterError::Closed => "emitter_closed",
            EmitterError::Full => "emitter_full",
            EmitterError::InvalidPattern { .. } => "emitter_invalid_pattern",
        }
    }
}
