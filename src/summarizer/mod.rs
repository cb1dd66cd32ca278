//! Summarizer capability used by the length gate.
//!
//! Backends:
//! - `ollama`: model-based summary via Ollama's /api/generate
//! - `truncate`: rule-based, keeps leading sentences within the word range

pub mod ollama;
pub mod truncate;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::SummarizerConfig;
use crate::error::SummarizeError;

pub use ollama::OllamaSummarizer;
pub use truncate::TruncatingSummarizer;

/// Input to a summarizer call.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRequest {
    pub text: String,
    pub min_words: usize,
    pub max_words: usize,
    /// Single best summary, no sampling.
    pub deterministic: bool,
}

#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Backend name for logs and `/status`.
    fn name(&self) -> &str;

    async fn summarize(&self, request: &SummaryRequest) -> Result<String, SummarizeError>;
}

/// Backend names accepted in `summarizer.backend`.
pub const BACKENDS: &[&str] = &["ollama", "truncate"];

/// Build the backend named in config.
pub fn from_config(config: &SummarizerConfig) -> Result<Arc<dyn Summarizer>, SummarizeError> {
    match config.backend.as_str() {
        "ollama" => Ok(Arc::new(OllamaSummarizer::new(
            &config.model,
            &config.host,
            config.request_timeout_ms,
        )?)),
        "truncate" => Ok(Arc::new(TruncatingSummarizer)),
        other => Err(SummarizeError::UnknownBackend(other.to_string())),
    }
}
