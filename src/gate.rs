//! Length gate: pass text through, or middle-trim and summarize it.
//!
//! Request flow:
//! 1. duration <= max → PassThrough
//! 2. word count <= min_words_to_reduce → ShortEnoughSkip
//! 3. keep the central `trim_ratio` of the words → Trimmed
//! 4. summarize within the word range, bounded by a timeout → Summarized
//!
//! The caller's duration is trusted as the decision input; the gate never
//! recomputes it. Failures are returned, never replaced by the original text.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::{GateError, Result};
use crate::summarizer::{Summarizer, SummaryRequest};

/// Decision thresholds. Defaults match a 150 wpm voice and a 60 s budget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateThresholds {
    pub max_duration_secs: f64,
    pub min_words_to_reduce: usize,
    pub trim_ratio: f64,
    pub summary_min_words: usize,
    pub summary_max_words: usize,
}

impl Default for GateThresholds {
    fn default() -> Self {
        Self {
            max_duration_secs: 60.0,
            min_words_to_reduce: 150,
            trim_ratio: 0.5,
            summary_min_words: 50,
            summary_max_words: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    PassThrough,
    Reduce,
}

impl GateDecision {
    pub fn for_duration(estimated_duration: f64, max_duration_secs: f64) -> Self {
        if estimated_duration <= max_duration_secs {
            Self::PassThrough
        } else {
            Self::Reduce
        }
    }
}

/// How the returned text was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    PassThrough,
    /// Reduce was requested but the text has too few words to shorten.
    ShortEnoughSkip,
    Summarized {
        input_words: usize,
        trimmed_words: usize,
        output_words: usize,
    },
}

impl Disposition {
    pub fn label(&self) -> &'static str {
        match self {
            Self::PassThrough => "pass_through",
            Self::ShortEnoughSkip => "short_enough_skip",
            Self::Summarized { .. } => "summarized",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateOutcome {
    pub text: String,
    pub disposition: Disposition,
}

/// Central window of `words`: drops equal head and tail spans.
///
/// `trim_size = floor(n * ratio)`, `start = floor((n - trim_size) / 2)`.
pub fn middle_trim<'a>(words: &'a [&'a str], ratio: f64) -> &'a [&'a str] {
    let n = words.len();
    let trim_size = ((n as f64 * ratio).floor() as usize).min(n);
    let start = (n - trim_size) / 2;
    &words[start..start + trim_size]
}

pub struct LengthGate {
    thresholds: GateThresholds,
    summarizer: Arc<dyn Summarizer>,
    timeout: Duration,
}

impl LengthGate {
    pub fn new(thresholds: GateThresholds, summarizer: Arc<dyn Summarizer>, timeout: Duration) -> Self {
        Self {
            thresholds,
            summarizer,
            timeout,
        }
    }

    pub fn thresholds(&self) -> &GateThresholds {
        &self.thresholds
    }

    pub fn summarizer_name(&self) -> &str {
        self.summarizer.name()
    }

    /// Gate `text` given the caller's estimated spoken duration in seconds.
    pub async fn gate(&self, text: &str, estimated_duration: f64) -> Result<GateOutcome> {
        if text.trim().is_empty() {
            return Err(GateError::InvalidInput("The 'text' field is missing.".into()));
        }
        if !estimated_duration.is_finite() || estimated_duration < 0.0 {
            return Err(GateError::InvalidInput(format!(
                "estimated duration must be a non-negative number, got {estimated_duration}"
            )));
        }

        let t = &self.thresholds;
        if GateDecision::for_duration(estimated_duration, t.max_duration_secs) == GateDecision::PassThrough {
            debug!("Gate: {estimated_duration:.1}s <= {}s, pass through", t.max_duration_secs);
            return Ok(GateOutcome {
                text: text.to_string(),
                disposition: Disposition::PassThrough,
            });
        }

        let words: Vec<&str> = text.split_whitespace().collect();
        if words.len() <= t.min_words_to_reduce {
            info!(
                "Gate: {estimated_duration:.1}s claimed but only {} words, skipping reduction",
                words.len()
            );
            return Ok(GateOutcome {
                text: text.to_string(),
                disposition: Disposition::ShortEnoughSkip,
            });
        }

        let trimmed = middle_trim(&words, t.trim_ratio);
        if trimmed.is_empty() {
            warn!(
                "Gate: trim ratio {} leaves no words of {}, not summarizing",
                t.trim_ratio,
                words.len()
            );
            return Err(GateError::ReductionFailed(format!(
                "trim ratio {} keeps no words of {}",
                t.trim_ratio,
                words.len()
            )));
        }
        let request = SummaryRequest {
            text: trimmed.join(" "),
            min_words: t.summary_min_words,
            max_words: t.summary_max_words,
            deterministic: true,
        };
        info!(
            "Gate: {estimated_duration:.1}s > {}s, trimmed {} → {} words, summarizing with {}",
            t.max_duration_secs,
            words.len(),
            trimmed.len(),
            self.summarizer.name()
        );

        let summary = match tokio::time::timeout(self.timeout, self.summarizer.summarize(&request)).await {
            Ok(Ok(summary)) => summary,
            Ok(Err(e)) => {
                warn!("Gate: summarizer failed: {e}");
                return Err(e.into());
            }
            Err(_) => {
                warn!("Gate: summarizer timed out after {}ms", self.timeout.as_millis());
                return Err(GateError::ReductionFailed(format!(
                    "summarizer timed out after {}ms",
                    self.timeout.as_millis()
                )));
            }
        };

        let summary = summary.trim();
        if summary.is_empty() {
            return Err(GateError::ReductionFailed("summarizer returned empty text".into()));
        }

        Ok(GateOutcome {
            disposition: Disposition::Summarized {
                input_words: words.len(),
                trimmed_words: trimmed.len(),
                output_words: summary.split_whitespace().count(),
            },
            text: summary.to_string(),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::SummarizeError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Records every request and answers with a fixed reply.
    pub(crate) struct MockSummarizer {
        pub calls: AtomicUsize,
        pub last: Mutex<Option<SummaryRequest>>,
        pub reply: std::result::Result<String, &'static str>,
        pub delay: Option<Duration>,
    }

    impl MockSummarizer {
        pub(crate) fn replying(reply: &str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                last: Mutex::new(None),
                reply: Ok(reply.to_string()),
                delay: None,
            }
        }

        pub(crate) fn failing() -> Self {
            Self {
                reply: Err("model crashed"),
                ..Self::replying("")
            }
        }
    }

    #[async_trait]
    impl Summarizer for MockSummarizer {
        fn name(&self) -> &str {
            "mock"
        }

        async fn summarize(&self, request: &SummaryRequest) -> std::result::Result<String, SummarizeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last.lock().unwrap() = Some(request.clone());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            match &self.reply {
                Ok(s) => Ok(s.clone()),
                Err(e) => Err(SummarizeError::Parse((*e).to_string())),
            }
        }
    }

    /// "w0 w1 w2 ..." so positions are visible in the output.
    pub(crate) fn numbered_words(n: usize) -> String {
        (0..n).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
    }

    fn gate_with(mock: Arc<MockSummarizer>) -> LengthGate {
        LengthGate::new(GateThresholds::default(), mock, Duration::from_secs(5))
    }

    #[test]
    fn middle_trim_of_300_words_is_75_to_225() {
        let text = numbered_words(300);
        let words: Vec<&str> = text.split_whitespace().collect();
        let trimmed = middle_trim(&words, 0.5);
        assert_eq!(trimmed.len(), 150);
        assert_eq!(trimmed.first(), Some(&"w75"));
        assert_eq!(trimmed.last(), Some(&"w224"));
    }

    #[test]
    fn middle_trim_floors_odd_counts() {
        let text = numbered_words(151);
        let words: Vec<&str> = text.split_whitespace().collect();
        // trim_size = 75, start = 38
        let trimmed = middle_trim(&words, 0.5);
        assert_eq!(trimmed.len(), 75);
        assert_eq!(trimmed[0], "w38");
    }

    #[test]
    fn decision_boundary_is_inclusive() {
        assert_eq!(GateDecision::for_duration(60.0, 60.0), GateDecision::PassThrough);
        assert_eq!(GateDecision::for_duration(60.01, 60.0), GateDecision::Reduce);
        assert_eq!(GateDecision::for_duration(0.0, 60.0), GateDecision::PassThrough);
    }

    #[tokio::test]
    async fn short_duration_passes_through_unchanged() {
        let mock = Arc::new(MockSummarizer::replying("summary"));
        let gate = gate_with(mock.clone());
        let text = "  keep   my\nspacing ";
        for d in [0.0, 15.0, 60.0] {
            let out = gate.gate(text, d).await.unwrap();
            assert_eq!(out.text, text);
            assert_eq!(out.disposition, Disposition::PassThrough);
        }
        // Long text with a short claimed duration is still trusted.
        let out = gate.gate(&numbered_words(500), 10.0).await.unwrap();
        assert_eq!(out.disposition, Disposition::PassThrough);
        assert_eq!(mock.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn few_words_are_never_reduced() {
        let mock = Arc::new(MockSummarizer::replying("summary"));
        let gate = gate_with(mock.clone());
        for n in [1, 50, 150] {
            let text = numbered_words(n);
            let out = gate.gate(&text, 999.0).await.unwrap();
            assert_eq!(out.text, text);
            assert_eq!(out.disposition, Disposition::ShortEnoughSkip);
        }
        assert_eq!(mock.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn reduce_feeds_middle_window_to_summarizer() {
        let mock = Arc::new(MockSummarizer::replying("  a short summary  "));
        let gate = gate_with(mock.clone());

        let out = gate.gate(&numbered_words(300), 120.0).await.unwrap();
        assert_eq!(out.text, "a short summary");
        assert_eq!(
            out.disposition,
            Disposition::Summarized {
                input_words: 300,
                trimmed_words: 150,
                output_words: 3
            }
        );

        let req = mock.last.lock().unwrap().clone().unwrap();
        let expected: Vec<String> = (75..225).map(|i| format!("w{i}")).collect();
        assert_eq!(req.text, expected.join(" "));
        assert_eq!((req.min_words, req.max_words), (50, 100));
        assert!(req.deterministic);
    }

    #[tokio::test]
    async fn five_hundred_words_trim_to_middle_250() {
        let mock = Arc::new(MockSummarizer::replying("summary"));
        let gate = gate_with(mock.clone());
        gate.gate(&numbered_words(500), 180.0).await.unwrap();

        let req = mock.last.lock().unwrap().clone().unwrap();
        let words: Vec<&str> = req.text.split_whitespace().collect();
        assert_eq!(words.len(), 250);
        assert_eq!(words[0], "w125");
        assert_eq!(words[249], "w374");
    }

    #[tokio::test]
    async fn empty_text_is_invalid_for_any_duration() {
        let gate = gate_with(Arc::new(MockSummarizer::replying("x")));
        for d in [0.0, 60.0, 500.0] {
            assert!(matches!(gate.gate("", d).await, Err(GateError::InvalidInput(_))));
            assert!(matches!(gate.gate(" \n ", d).await, Err(GateError::InvalidInput(_))));
        }
    }

    #[tokio::test]
    async fn bad_duration_is_invalid() {
        let gate = gate_with(Arc::new(MockSummarizer::replying("x")));
        for d in [f64::NAN, f64::INFINITY, -1.0] {
            assert!(matches!(gate.gate("hello", d).await, Err(GateError::InvalidInput(_))));
        }
    }

    #[tokio::test]
    async fn summarizer_error_is_reduction_failed() {
        let gate = gate_with(Arc::new(MockSummarizer::failing()));
        let err = gate.gate(&numbered_words(300), 120.0).await.unwrap_err();
        assert!(matches!(err, GateError::ReductionFailed(_)));
    }

    #[tokio::test]
    async fn empty_summary_is_reduction_failed() {
        let gate = gate_with(Arc::new(MockSummarizer::replying("   ")));
        let err = gate.gate(&numbered_words(300), 120.0).await.unwrap_err();
        assert!(matches!(err, GateError::ReductionFailed(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_summarizer_times_out() {
        let mock = Arc::new(MockSummarizer {
            delay: Some(Duration::from_secs(30)),
            ..MockSummarizer::replying("too late")
        });
        let gate = LengthGate::new(GateThresholds::default(), mock, Duration::from_millis(200));
        let err = gate.gate(&numbered_words(300), 120.0).await.unwrap_err();
        assert_eq!(
            err,
            GateError::ReductionFailed("summarizer timed out after 200ms".into())
        );
    }

    #[tokio::test]
    async fn empty_trim_window_never_reaches_summarizer() {
        let mock = Arc::new(MockSummarizer::replying("a model summary of nothing"));
        let thresholds = GateThresholds {
            trim_ratio: 0.005,
            ..GateThresholds::default()
        };
        let gate = LengthGate::new(thresholds, mock.clone(), Duration::from_secs(5));
        let err = gate.gate(&numbered_words(160), 90.0).await.unwrap_err();
        assert!(matches!(err, GateError::ReductionFailed(_)));
        assert_eq!(mock.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn regating_pass_through_output_is_a_no_op() {
        let gate = gate_with(Arc::new(MockSummarizer::replying("unused")));
        let text = numbered_words(40);
        let once = gate.gate(&text, 16.0).await.unwrap().text;
        let twice = gate.gate(&once, 16.0).await.unwrap().text;
        assert_eq!(once, text);
        assert_eq!(twice, once);
    }
}
