//! Gate decision history and reporting.
//!
//! Stores one record per request in JSONL files at {dir}/{date}-gate.jsonl.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::HistoryConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateRecord {
    pub timestamp: String,
    /// pass_through, short_enough_skip, summarized, invalid_input, reduction_failed
    pub decision: String,
    pub input_words: usize,
    pub output_words: usize,
    pub estimated_duration_secs: f64,
    pub summarizer: String,
    pub latency_ms: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct GateHistory {
    dir: PathBuf,
}

impl GateHistory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `None` when history is disabled or no directory can be resolved.
    pub fn from_config(config: &HistoryConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }
        let dir = config
            .dir
            .clone()
            .or_else(|| dirs::home_dir().map(|h| h.join(".speech-gate-history")))?;
        Some(Self::new(dir))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn history_file(&self, date: &str) -> PathBuf {
        let date = if date == "today" {
            Local::now().format("%Y-%m-%d").to_string()
        } else {
            date.to_string()
        };
        self.dir.join(format!("{date}-gate.jsonl"))
    }

    pub fn save(&self, record: &GateRecord) {
        if let Err(e) = fs::create_dir_all(&self.dir) {
            warn!("Failed to create gate history dir: {e}");
            return;
        }

        let path = self.history_file("today");
        let mut file = match fs::OpenOptions::new().create(true).append(true).open(&path) {
            Ok(f) => f,
            Err(e) => {
                warn!("Failed to open gate history file: {e}");
                return;
            }
        };

        match serde_json::to_string(record) {
            Ok(line) => {
                if let Err(e) = writeln!(file, "{line}") {
                    warn!("Failed to write gate history record: {e}");
                } else {
                    debug!("Saved gate record to {}", path.display());
                }
            }
            Err(e) => warn!("Failed to serialize gate record: {e}"),
        }
    }

    pub fn load(&self, date: &str) -> Vec<GateRecord> {
        let Ok(contents) = fs::read_to_string(self.history_file(date)) else {
            return Vec::new();
        };

        contents
            .lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect()
    }

    /// Dates with records, oldest first.
    pub fn list_dates(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return Vec::new();
        };

        let mut dates: Vec<String> = entries
            .filter_map(|e| e.ok())
            .filter_map(|e| {
                let name = e.file_name().to_string_lossy().to_string();
                name.strip_suffix("-gate.jsonl").map(str::to_string)
            })
            .collect();
        dates.sort();
        dates
    }

    pub fn report(&self, date: &str) -> String {
        let records = self.load(date);
        if records.is_empty() {
            return format!("No gate records for {date}.");
        }

        let total = records.len();
        let errors = records.iter().filter(|r| r.error.is_some()).count();
        let reduced: Vec<&GateRecord> = records.iter().filter(|r| r.decision == "summarized").collect();

        let avg_latency: f64 = records.iter().map(|r| r.latency_ms as f64).sum::<f64>() / total as f64;
        let avg_reduction = if reduced.is_empty() {
            0.0
        } else {
            reduced
                .iter()
                .map(|r| r.output_words as f64 / r.input_words.max(1) as f64)
                .sum::<f64>()
                / reduced.len() as f64
        };

        let mut decisions = BTreeMap::new();
        for r in &records {
            *decisions.entry(r.decision.as_str()).or_insert(0) += 1;
        }

        let mut report = format!(
            "# Gate Report for {date}\n\n\
            - Total requests: {total}\n\
            - Summarized: {}\n\
            - Errors: {errors}\n\
            - Avg latency: {avg_latency:.0}ms\n\
            - Avg summary/input word ratio: {avg_reduction:.2}\n\n\
            ## Decisions\n",
            reduced.len()
        );

        for (decision, count) in &decisions {
            report.push_str(&format!("- {decision}: {count}\n"));
        }

        report
    }
}
