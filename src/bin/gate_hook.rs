//! gate-hook: before-TTS filter for voice agents.
//!
//! Reads the response text from stdin, sends it through the length gate
//! and writes the text to speak to stdout. Logs go to stderr. On gate
//! failure the configured fallback policy decides between speaking the
//! original text and exiting non-zero.

use std::io::{Read, Write};
use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use speech_gate::client::{ClientError, FallbackPolicy, GateClient};
use speech_gate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "gate-hook", about = "Gate TTS input read from stdin")]
struct Args {
    /// Path to config.yaml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the gate URL
    #[arg(long)]
    url: Option<String>,

    /// Override the fallback policy: use_original, abort, or retry_once
    #[arg(long, value_parser = parse_policy)]
    on_gate_error: Option<FallbackPolicy>,

    /// Enable verbose (debug) logging
    #[arg(short, long)]
    verbose: bool,
}

fn parse_policy(s: &str) -> Result<FallbackPolicy, String> {
    match s {
        "use_original" => Ok(FallbackPolicy::UseOriginal),
        "abort" => Ok(FallbackPolicy::Abort),
        "retry_once" => Ok(FallbackPolicy::RetryOnce),
        other => Err(format!("unknown policy '{other}'")),
    }
}

/// Writes `text` followed by exactly one newline.
fn write_gated(out: &mut impl Write, text: &str) -> std::io::Result<()> {
    let text = text.strip_suffix('\n').unwrap_or(text);
    let text = text.strip_suffix('\r').unwrap_or(text);
    writeln!(out, "{text}")?;
    out.flush()
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();
    let t0 = Instant::now();

    let filter = if args.verbose {
        EnvFilter::new("debug,hyper=info,reqwest=info")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = Config::load(args.config.as_deref());
    if let Some(url) = args.url {
        config.client.gate_url = url;
    }
    if let Some(policy) = args.on_gate_error {
        config.client.on_gate_error = policy;
    }

    let mut input = String::new();
    if let Err(e) = std::io::stdin().read_to_string(&mut input) {
        error!("Failed to read stdin: {e}");
        std::process::exit(2);
    }

    let client = match GateClient::from_config(&config) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to create gate client: {e}");
            std::process::exit(2);
        }
    };

    match client.validate(&input).await {
        Ok(gated) => {
            info!(
                "Gated {} → {} chars in {}ms (fallback={})",
                input.len(),
                gated.text.len(),
                t0.elapsed().as_millis(),
                gated.fallback_used
            );
            let mut stdout = std::io::stdout().lock();
            if let Err(e) = write_gated(&mut stdout, &gated.text) {
                error!("Failed to write gated text to stdout: {e}");
                std::process::exit(2);
            }
        }
        // Nothing to say is not a failure.
        Err(ClientError::EmptyText) => {}
        Err(e) => {
            error!("Gate failed with policy {:?}: {e}", client.policy());
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_policy_names() {
        assert_eq!(parse_policy("abort"), Ok(FallbackPolicy::Abort));
        assert_eq!(parse_policy("retry_once"), Ok(FallbackPolicy::RetryOnce));
        assert_eq!(parse_policy("use_original"), Ok(FallbackPolicy::UseOriginal));
        assert!(parse_policy("sometimes").is_err());
    }

    #[test]
    fn output_ends_with_a_single_newline() {
        let mut out = Vec::new();
        write_gated(&mut out, "spoken text\n").unwrap();
        assert_eq!(out, b"spoken text\n");

        let mut out = Vec::new();
        write_gated(&mut out, "summary").unwrap();
        assert_eq!(out, b"summary\n");
    }

    #[test]
    fn write_errors_are_reported() {
        struct BrokenPipe;
        impl Write for BrokenPipe {
            fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
                Err(std::io::ErrorKind::BrokenPipe.into())
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }
        assert!(write_gated(&mut BrokenPipe, "text").is_err());
    }
}
