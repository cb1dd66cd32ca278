//! speech-gate: length gate service for voice assistant TTS input.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use speech_gate::api::{self, GateApiState};
use speech_gate::config::Config;
use speech_gate::gate::LengthGate;
use speech_gate::history::GateHistory;
use speech_gate::summarizer;

#[derive(Parser, Debug)]
#[command(name = "speech-gate", about = "Duration gate for TTS input")]
struct Args {
    /// Path to config.yaml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listen port
    #[arg(short, long)]
    port: Option<u16>,

    /// Override the summarizer backend: ollama or truncate
    #[arg(long)]
    summarizer: Option<String>,

    /// Print the gate report for a date (today, list, or YYYY-MM-DD) and exit
    #[arg(long)]
    report: Option<String>,

    /// Enable verbose (debug) logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize logging (suppress noisy HTTP internals)
    let filter = if args.verbose {
        EnvFilter::new("debug,hyper=info,reqwest=info")
    } else {
        EnvFilter::new("info,hyper=warn,reqwest=warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = Config::load(args.config.as_deref());
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(backend) = args.summarizer {
        config.summarizer.backend = backend;
    }

    let history = GateHistory::from_config(&config.history);

    if let Some(date) = args.report {
        let Some(history) = history else {
            return Err("history is disabled in config".into());
        };
        if date == "list" {
            for d in history.list_dates() {
                println!("{d}");
            }
        } else {
            println!("{}", history.report(&date));
        }
        return Ok(());
    }

    let problems = config.validate();
    if !problems.is_empty() {
        for p in &problems {
            warn!("Config: {p}");
        }
        return Err(format!("invalid configuration ({} problems)", problems.len()).into());
    }

    info!("speech-gate starting");
    info!(
        "Gate: {} wpm, max {}s, reduce above {} words, trim ratio {}, summary {}-{} words",
        config.gate.words_per_minute,
        config.gate.max_duration_secs,
        config.gate.min_words_to_reduce,
        config.gate.trim_ratio,
        config.gate.summary_min_words,
        config.gate.summary_max_words,
    );

    let summarizer = summarizer::from_config(&config.summarizer)?;
    info!("Summarizer: {}", summarizer.name());

    match &history {
        Some(h) => info!("Gate history: {}", h.dir().display()),
        None => info!("Gate history disabled"),
    }

    let gate = LengthGate::new(config.gate.thresholds(), summarizer, config.gate.summarize_timeout());
    let state = GateApiState {
        gate: Arc::new(gate),
        rate: config.gate.rate(),
        history: history.map(Arc::new),
    };

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutting down");
            }
            shutdown.cancel();
        }
    });

    api::serve(state, &config.server.host, config.server.port, shutdown).await?;

    Ok(())
}
