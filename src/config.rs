//! Configuration management for speech-gate.
//!
//! Loads config from YAML files in standard locations. Every section has
//! defaults, so an empty or missing file yields a working gate.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::client::FallbackPolicy;
use crate::estimator::{SpeakingRate, DEFAULT_WORDS_PER_MINUTE};
use crate::gate::GateThresholds;
use crate::summarizer;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 5000,
        }
    }
}

/// Speaking rate and thresholds. Shared by the server and the caller.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    pub words_per_minute: f64,
    pub max_duration_secs: f64,
    pub min_words_to_reduce: usize,
    pub trim_ratio: f64,
    pub summary_min_words: usize,
    pub summary_max_words: usize,
    pub summarize_timeout_ms: u64,
}

impl Default for GateConfig {
    fn default() -> Self {
        let t = GateThresholds::default();
        Self {
            words_per_minute: DEFAULT_WORDS_PER_MINUTE,
            max_duration_secs: t.max_duration_secs,
            min_words_to_reduce: t.min_words_to_reduce,
            trim_ratio: t.trim_ratio,
            summary_min_words: t.summary_min_words,
            summary_max_words: t.summary_max_words,
            summarize_timeout_ms: 10_000,
        }
    }
}

impl GateConfig {
    pub fn rate(&self) -> SpeakingRate {
        SpeakingRate::new(self.words_per_minute)
    }

    pub fn thresholds(&self) -> GateThresholds {
        GateThresholds {
            max_duration_secs: self.max_duration_secs,
            min_words_to_reduce: self.min_words_to_reduce,
            trim_ratio: self.trim_ratio,
            summary_min_words: self.summary_min_words,
            summary_max_words: self.summary_max_words,
        }
    }

    pub fn summarize_timeout(&self) -> Duration {
        Duration::from_millis(self.summarize_timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    /// `ollama` or `truncate`
    pub backend: String,
    pub model: String,
    pub host: String,
    pub request_timeout_ms: u64,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            backend: "ollama".into(),
            model: "llama3.2:3b".into(),
            host: "http://localhost:11434".into(),
            request_timeout_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub gate_url: String,
    pub on_gate_error: FallbackPolicy,
    pub timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            gate_url: "http://127.0.0.1:5000/validate_audio".into(),
            on_gate_error: FallbackPolicy::UseOriginal,
            timeout_ms: 15_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub enabled: bool,
    /// Defaults to ~/.speech-gate-history
    pub dir: Option<PathBuf>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub gate: GateConfig,
    pub summarizer: SummarizerConfig,
    pub client: ClientConfig,
    pub history: HistoryConfig,
}

impl Config {
    /// Load configuration from YAML file.
    ///
    /// Missing or unreadable files yield defaults; values are not checked
    /// here. Callers run `validate()` on the result before building a gate.
    ///
    /// Searches standard locations if no path is provided:
    /// 1. ./config.yaml
    /// 2. ~/.config/speech-gate/config.yaml
    /// 3. /etc/speech-gate/config.yaml
    pub fn load(path: Option<&Path>) -> Self {
        let resolved = path.map(PathBuf::from).or_else(|| {
            let candidates = [
                std::env::current_dir().ok().map(|d| d.join("config.yaml")),
                dirs::home_dir().map(|h| h.join(".config/speech-gate/config.yaml")),
                Some(PathBuf::from("/etc/speech-gate/config.yaml")),
            ];
            candidates.into_iter().flatten().find(|p| p.exists())
        });

        let Some(config_path) = resolved else {
            info!("No config file found, using defaults");
            return Self::default();
        };

        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match serde_yml::from_str(&contents) {
                Ok(config) => {
                    info!("Loaded config from {}", config_path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {e}, using defaults", config_path.display());
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read {}: {e}, using defaults", config_path.display());
                Self::default()
            }
        }
    }

    /// Problems that would make the gate misbehave. Empty when valid.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let g = &self.gate;

        if !g.rate().is_valid() {
            problems.push(format!("gate.words_per_minute must be positive, got {}", g.words_per_minute));
        }
        if !(g.max_duration_secs.is_finite() && g.max_duration_secs >= 0.0) {
            problems.push(format!("gate.max_duration_secs must be non-negative, got {}", g.max_duration_secs));
        }
        if !(g.trim_ratio > 0.0 && g.trim_ratio <= 1.0) {
            problems.push(format!("gate.trim_ratio must be in (0, 1], got {}", g.trim_ratio));
        }
        if g.summary_min_words > g.summary_max_words {
            problems.push(format!(
                "gate.summary_min_words ({}) exceeds gate.summary_max_words ({})",
                g.summary_min_words, g.summary_max_words
            ));
        }
        if g.summarize_timeout_ms == 0 {
            problems.push("gate.summarize_timeout_ms must be greater than zero".into());
        }
        if !summarizer::BACKENDS.contains(&self.summarizer.backend.as_str()) {
            problems.push(format!(
                "summarizer.backend must be one of {}, got '{}'",
                summarizer::BACKENDS.join(", "),
                self.summarizer.backend
            ));
        }
        problems
    }
}
