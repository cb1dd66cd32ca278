//! speech-gate: keeps synthesized voice responses inside a time budget.
//!
//! Estimates how long a response takes to speak and, when it runs over,
//! trims it to its middle and summarizes it before it reaches TTS.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod estimator;
pub mod gate;
pub mod history;
pub mod summarizer;
