//! Error types for the Sentinel engine.

use thiserror::Error;

/// Errors surfaced by the detection, scoring, and decision path.
///
/// Side-channel (persistence/telemetry) failures never appear here; they
/// are confined to `sentinel-sinks` and swallowed by its dispatcher.
#[derive(Debug, Error)]
pub enum SentinelError {
    /// Malformed or out-of-range input. Caller-correctable; raised before
    /// any matching runs, with zero findings.
    #[error("invalid request: {0}")]
    Validation(String),

    /// A rule pattern failed to compile. Raised at corpus load time,
    /// never per call.
    #[error("corpus error in rule '{rule_id}': {message}")]
    Corpus {
        /// Id of the offending rule.
        rule_id: String,
        /// Compile failure detail.
        message: String,
    },

    /// Unexpected fault during scoring or decision. Fail safe: the call
    /// returns this error instead of a partial (or silently allowing)
    /// result.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SentinelError {
    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        SentinelError::Validation(message.into())
    }

    /// Returns true if the caller can correct this error.
    pub fn is_validation(&self) -> bool {
        matches!(self, SentinelError::Validation(_))
    }
}
