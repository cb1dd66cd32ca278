//! Ollama text summarization for gated TTS input.
//!
//! Asks the model for a summary inside a word range. Unlike a best-effort
//! TTS helper, every failure is returned to the gate; nothing is
//! truncated or substituted here.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, info, warn};

use super::{Summarizer, SummaryRequest};
use crate::error::SummarizeError;

const SUMMARIZE_PROMPT: &str = r#"Summarize the following text in {min} to {max} words. The summary will be read aloud by a text-to-speech voice, so write plain conversational sentences without lists, markdown, or symbols. Output ONLY the summary, nothing else.

Text: {text}

Summary:"#;

/// Fixed seed used when a deterministic summary is requested.
const DETERMINISTIC_SEED: u64 = 42;

pub struct OllamaSummarizer {
    model: String,
    host: String,
    client: Client,
}

impl OllamaSummarizer {
    pub fn new(model: &str, host: &str, timeout_ms: u64) -> Result<Self, SummarizeError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()?;

        Ok(Self {
            model: model.to_string(),
            host: host.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn build_body(&self, request: &SummaryRequest) -> serde_json::Value {
        let prompt = SUMMARIZE_PROMPT
            .replace("{min}", &request.min_words.to_string())
            .replace("{max}", &request.max_words.to_string())
            .replace("{text}", &request.text);

        // Rough token budget: ~1.5 tokens per word plus slack.
        let num_predict = request.max_words * 3 / 2 + 32;

        let options = if request.deterministic {
            json!({
                "temperature": 0.0,
                "top_k": 1,
                "seed": DETERMINISTIC_SEED,
                "num_predict": num_predict
            })
        } else {
            json!({
                "temperature": 0.3,
                "num_predict": num_predict
            })
        };

        json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "options": options
        })
    }
}

#[async_trait]
impl Summarizer for OllamaSummarizer {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn summarize(&self, request: &SummaryRequest) -> Result<String, SummarizeError> {
        let t_start = Instant::now();
        let url = format!("{}/api/generate", self.host);
        debug!("Sending {} chars to Ollama model '{}'", request.text.len(), self.model);

        let resp = match self.client.post(&url).json(&self.build_body(request)).send().await {
            Ok(resp) => resp,
            Err(e) => {
                if e.is_connect() {
                    warn!("Cannot connect to Ollama at {}", self.host);
                } else if e.is_timeout() {
                    warn!("Ollama summarizer request timed out");
                } else {
                    warn!("Ollama summarizer request failed: {e}");
                }
                return Err(e.into());
            }
        };

        if !resp.status().is_success() {
            warn!("Ollama summarizer returned status {}", resp.status());
            return Err(SummarizeError::Status(resp.status().as_u16()));
        }

        let data: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| SummarizeError::Parse(e.to_string()))?;

        let Some(summary) = data["response"].as_str() else {
            return Err(SummarizeError::Parse("missing 'response' field".into()));
        };
        let summary = summary.trim();
        if summary.is_empty() {
            warn!("Ollama summarizer returned empty response");
            return Err(SummarizeError::Empty);
        }

        let latency_ms = t_start.elapsed().as_secs_f64() * 1000.0;
        info!(
            "Summarized {} chars → {} chars ({latency_ms:.0}ms)",
            request.text.len(),
            summary.len()
        );
        Ok(summary.to_string())
    }
}
