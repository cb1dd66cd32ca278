//! HTTP API for the length gate.
//!
//! `POST /validate_audio` takes `{"text", "length"}` and answers
//! `{"message"}` on success or `{"error"}` with a 4xx/5xx status.
//! `GET /status` reports the active thresholds and summarizer backend.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::GateError;
use crate::estimator::{word_count, SpeakingRate};
use crate::gate::{Disposition, LengthGate};
use crate::history::{GateHistory, GateRecord};

#[derive(Clone)]
pub struct GateApiState {
    pub gate: Arc<LengthGate>,
    pub rate: SpeakingRate,
    pub history: Option<Arc<GateHistory>>,
}

// --- Request/Response types ---

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ValidateRequest {
    pub text: Option<String>,
    /// Caller's estimated spoken duration in seconds.
    pub length: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ValidateResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidateResponse {
    fn ok(message: String) -> Self {
        Self {
            message: Some(message),
            error: None,
        }
    }

    fn err(message: impl Into<String>) -> Self {
        Self {
            message: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Serialize)]
struct StatusResponse {
    status: &'static str,
    summarizer: String,
    words_per_minute: f64,
    max_duration_secs: f64,
    min_words_to_reduce: usize,
}

type ApiReply = (StatusCode, Json<ValidateResponse>);

/// Build the axum router.
pub fn router(state: GateApiState) -> Router {
    Router::new()
        .route("/status", get(handle_status))
        .route("/validate_audio", post(handle_validate_audio))
        .with_state(state)
}

/// Serve the gate API until `shutdown` is cancelled.
pub async fn serve(state: GateApiState, host: &str, port: u16, shutdown: CancellationToken) -> std::io::Result<()> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Gate API listening on {addr}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
}

// --- Handlers ---

async fn handle_status(State(state): State<GateApiState>) -> Json<StatusResponse> {
    let t = state.gate.thresholds();
    Json(StatusResponse {
        status: "ok",
        summarizer: state.gate.summarizer_name().to_string(),
        words_per_minute: state.rate.words_per_minute,
        max_duration_secs: t.max_duration_secs,
        min_words_to_reduce: t.min_words_to_reduce,
    })
}

async fn handle_validate_audio(
    State(state): State<GateApiState>,
    body: Result<Json<ValidateRequest>, JsonRejection>,
) -> ApiReply {
    let req = match body {
        Ok(Json(req)) => req,
        Err(e) => {
            warn!("/validate_audio rejected body: {e}");
            return (
                StatusCode::BAD_REQUEST,
                Json(ValidateResponse::err(format!("Invalid request body: {}", e.body_text()))),
            );
        }
    };

    let t_start = Instant::now();
    let text = req.text.unwrap_or_default();
    let length = req.length.unwrap_or(0.0);
    let input_words = word_count(&text);

    let preview: String = text.chars().take(80).collect();
    info!(
        "HTTP /validate_audio: \"{}{}\" ({input_words} words, length={length:.1}s)",
        preview.replace('\n', " "),
        if text.chars().count() > 80 { "..." } else { "" },
    );

    let result = state.gate.gate(&text, length).await;
    let latency_ms = t_start.elapsed().as_secs_f64() * 1000.0;

    let (decision, output_words, error) = match &result {
        Ok(outcome) => {
            let output_words = match outcome.disposition {
                Disposition::Summarized { output_words, .. } => output_words,
                _ => input_words,
            };
            (outcome.disposition.label(), output_words, None)
        }
        Err(GateError::InvalidInput(msg)) => ("invalid_input", 0, Some(msg.clone())),
        Err(e @ GateError::ReductionFailed(_)) => ("reduction_failed", 0, Some(e.to_string())),
    };
    info!("Gate complete: {decision} {input_words} → {output_words} words ({latency_ms:.0}ms)");

    if let Some(history) = &state.history {
        history.save(&GateRecord {
            timestamp: chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
            decision: decision.to_string(),
            input_words,
            output_words,
            estimated_duration_secs: length,
            summarizer: state.gate.summarizer_name().to_string(),
            latency_ms: latency_ms as i64,
            error,
        });
    }

    match result {
        Ok(outcome) => (StatusCode::OK, Json(ValidateResponse::ok(outcome.text))),
        Err(GateError::InvalidInput(msg)) => (StatusCode::BAD_REQUEST, Json(ValidateResponse::err(msg))),
        Err(e @ GateError::ReductionFailed(_)) => {
            (StatusCode::BAD_GATEWAY, Json(ValidateResponse::err(e.to_string())))
        }
    }
}
