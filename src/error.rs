//! Error types for speech-gate.

use thiserror::Error;

/// Gate errors. These are the only two outcomes besides success.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GateError {
    /// Empty or missing text, or an unusable duration.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Summarizer failed, timed out, or produced nothing usable.
    #[error("Text reduction failed: {0}")]
    ReductionFailed(String),
}

/// Summarizer backend errors
#[derive(Error, Debug)]
pub enum SummarizeError {
    #[error("Summarizer request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Summarizer returned status {0}")]
    Status(u16),

    #[error("Failed to parse summarizer response: {0}")]
    Parse(String),

    #[error("Summarizer returned an empty summary")]
    Empty,

    #[error("Unknown summarizer backend '{0}' (expected one of: ollama, truncate)")]
    UnknownBackend(String),
}

impl From<SummarizeError> for GateError {
    fn from(e: SummarizeError) -> Self {
        GateError::ReductionFailed(e.to_string())
    }
}

/// Result type for gate operations
pub type Result<T> = std::result::Result<T, GateError>;
