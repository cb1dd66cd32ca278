//! Rule-based summarizer: keeps leading sentences within the word range.
//!
//! No model, no network. Useful offline and as a predictable backend.

use async_trait::async_trait;

use super::{Summarizer, SummaryRequest};
use crate::error::SummarizeError;

pub struct TruncatingSummarizer;

impl TruncatingSummarizer {
    /// Whole leading sentences up to `max_words`. When that would leave
    /// fewer than `min_words`, cut at exactly `max_words` words instead.
    pub fn truncate(text: &str, min_words: usize, max_words: usize) -> String {
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.len() <= max_words {
            return words.join(" ");
        }

        let mut end = 0;
        for (i, w) in words.iter().enumerate().take(max_words) {
            if w.ends_with(['.', '!', '?']) {
                end = i + 1;
            }
        }

        if end == 0 || end < min_words {
            end = max_words;
        }
        words[..end].join(" ")
    }
}

#[async_trait]
impl Summarizer for TruncatingSummarizer {
    fn name(&self) -> &str {
        "truncate"
    }

    async fn summarize(&self, request: &SummaryRequest) -> Result<String, SummarizeError> {
        let summary = Self::truncate(&request.text, request.min_words, request.max_words);
        if summary.is_empty() {
            return Err(SummarizeError::Empty);
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentence(n: usize) -> String {
        let mut words = vec!["word"; n];
        words[n - 1] = "end.";
        words.join(" ")
    }

    #[test]
    fn short_text_is_kept_whole() {
        assert_eq!(TruncatingSummarizer::truncate("a  b\nc", 1, 10), "a b c");
    }

    #[test]
    fn keeps_whole_sentences_within_max() {
        // 40 + 40 + 40 words: two sentences fit in 100.
        let text = format!("{} {} {}", sentence(40), sentence(40), sentence(40));
        let out = TruncatingSummarizer::truncate(&text, 50, 100);
        assert_eq!(out.split_whitespace().count(), 80);
        assert!(out.ends_with("end."));
    }

    #[test]
    fn falls_back_to_hard_cut_below_min() {
        // One 30-word sentence then a 200-word run-on.
        let text = format!("{} {}", sentence(30), sentence(200));
        let out = TruncatingSummarizer::truncate(&text, 50, 100);
        assert_eq!(out.split_whitespace().count(), 100);
    }

    #[tokio::test]
    async fn empty_text_is_an_error() {
        let req = SummaryRequest {
            text: "   ".into(),
            min_words: 50,
            max_words: 100,
            deterministic: true,
        };
        assert!(matches!(
            TruncatingSummarizer.summarize(&req).await,
            Err(SummarizeError::Empty)
        ));
    }
}
