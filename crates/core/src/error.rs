//! The error taxonomy shared by every ReMind crate.
//!
//! Adapter implementations translate transport-level failures into one of
//! these kinds exactly once, at the adapter boundary (see `remind-adapters`).
//! Business crates match on kind, not on string content, and the HTTP facade
//! is the single place that maps a kind to a status code.

use thiserror::Error;

/// The public error contract for ReMind. Variants correspond 1:1 to the
/// error kinds enumerated in the design: malformed input, missing records,
/// external-dependency failure, timeouts, and invariant violations.
#[derive(Debug, Error)]
pub enum RemindError {
    #[error("input error: {0}")]
    InputError(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("retrieval unavailable: {0}")]
    RetrievalUnavailable(String),

    #[error("narration unavailable: {0}")]
    NarrationUnavailable(String),

    #[error("experience composition failed: {0}")]
    ComposeFailed(String),

    #[error("tts unavailable: {0}")]
    TtsUnavailable(String),

    #[error("lip-sync unavailable: {0}")]
    LipSyncUnavailable(String),

    #[error("external dependency unavailable: {0}")]
    ExternalUnavailable(String),

    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("operation timed out: {0}")]
    Timeout(String),

    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

impl RemindError {
    /// A short, stable tag used in log fields and JSON error bodies; never
    /// matched on by callers, only logged or surfaced for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            RemindError::InputError(_) => "input_error",
            RemindError::NotFound(_) => "not_found",
            RemindError::RetrievalUnavailable(_) => "retrieval_unavailable",
            RemindError::NarrationUnavailable(_) => "narration_unavailable",
            RemindError::ComposeFailed(_) => "compose_failed",
            RemindError::TtsUnavailable(_) => "tts_unavailable",
            RemindError::LipSyncUnavailable(_) => "lipsync_unavailable",
            RemindError::ExternalUnavailable(_) => "external_unavailable",
            RemindError::QuotaExceeded(_) => "quota_exceeded",
            RemindError::Timeout(_) => "timeout",
            RemindError::InvariantViolation(_) => "invariant_violation",
        }
    }
}

pub type Result<T> = std::result::Result<T, RemindError>;
