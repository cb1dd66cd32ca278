//! Caller-side gate integration.
//!
//! Estimates the spoken duration with the shared speaking rate, sends
//! `{text, length}` to the gate and returns the text to synthesize. What
//! happens when the gate fails is an explicit `FallbackPolicy`.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::estimator::SpeakingRate;

/// What the caller does when the gate errors or is unreachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Speak the original, un-gated text.
    #[default]
    UseOriginal,
    /// Surface the error and drop the turn.
    Abort,
    /// Try the gate once more, then surface the error.
    RetryOnce,
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Nothing to gate: text is empty")]
    EmptyText,

    #[error("Gate request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Gate returned {status}: {message}")]
    Gate { status: u16, message: String },

    #[error("Failed to parse gate response: {0}")]
    Parse(String),
}

/// Text to hand to speech synthesis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatedText {
    pub text: String,
    /// True when the gate failed and the original text was kept.
    pub fallback_used: bool,
}

#[derive(Serialize)]
struct ValidateRequest<'a> {
    text: &'a str,
    length: f64,
}

#[derive(Deserialize)]
struct ValidateResponse {
    message: Option<String>,
    error: Option<String>,
}

pub struct GateClient {
    url: String,
    rate: SpeakingRate,
    policy: FallbackPolicy,
    client: Client,
}

impl GateClient {
    pub fn new(
        url: &str,
        rate: SpeakingRate,
        policy: FallbackPolicy,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_millis(500))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            url: url.to_string(),
            rate,
            policy,
            client,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ClientError> {
        Self::new(
            &config.client.gate_url,
            config.gate.rate(),
            config.client.on_gate_error,
            Duration::from_millis(config.client.timeout_ms),
        )
    }

    pub fn policy(&self) -> FallbackPolicy {
        self.policy
    }

    /// Gate `text` before TTS, applying the fallback policy on failure.
    pub async fn validate(&self, text: &str) -> Result<GatedText, ClientError> {
        if text.trim().is_empty() {
            return Err(ClientError::EmptyText);
        }

        let length = self.rate.estimate_duration(text);
        debug!("Text before gating ({length:.1}s): {text}");

        let result = match self.call_gate(text, length).await {
            Err(e) if self.policy == FallbackPolicy::RetryOnce => {
                warn!("Gate call failed ({e}), retrying once");
                self.call_gate(text, length).await
            }
            other => other,
        };

        match result {
            Ok(message) => {
                debug!("Text after gating: {message}");
                Ok(GatedText {
                    text: message,
                    fallback_used: false,
                })
            }
            Err(e) if self.policy == FallbackPolicy::UseOriginal => {
                warn!("Gate failed ({e}), speaking original text ({length:.1}s)");
                Ok(GatedText {
                    text: text.to_string(),
                    fallback_used: true,
                })
            }
            Err(e) => Err(e),
        }
    }

    async fn call_gate(&self, text: &str, length: f64) -> Result<String, ClientError> {
        let resp = self
            .client
            .post(&self.url)
            .json(&ValidateRequest { text, length })
            .send()
            .await?;

        let status = resp.status();
        let body: ValidateResponse = resp
            .json()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))?;

        if !status.is_success() {
            return Err(ClientError::Gate {
                status: status.as_u16(),
                message: body.error.unwrap_or_else(|| "unknown error".into()),
            });
        }

        match body.message {
            Some(message) if !message.trim().is_empty() => {
                info!("Gate returned {} chars for {} chars", message.len(), text.len());
                Ok(message)
            }
            _ => Err(ClientError::Parse("missing 'message' field".into())),
        }
    }
}
