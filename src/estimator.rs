//! Spoken duration estimate from word count.
//!
//! Both the gate server and the calling agent read the same
//! `SpeakingRate` out of `GateConfig`, so the 60 s / 150 word thresholds
//! stay calibrated end to end.

/// Default speaking rate: 150 words per 60 seconds (2.5 words/s).
pub const DEFAULT_WORDS_PER_MINUTE: f64 = 150.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeakingRate {
    pub words_per_minute: f64,
}

impl Default for SpeakingRate {
    fn default() -> Self {
        Self {
            words_per_minute: DEFAULT_WORDS_PER_MINUTE,
        }
    }
}

impl SpeakingRate {
    pub fn new(words_per_minute: f64) -> Self {
        Self { words_per_minute }
    }

    pub fn words_per_second(&self) -> f64 {
        self.words_per_minute / 60.0
    }

    pub fn is_valid(&self) -> bool {
        self.words_per_minute.is_finite() && self.words_per_minute > 0.0
    }

    /// Seconds needed to speak `words` words.
    pub fn estimate_for_words(&self, words: usize) -> f64 {
        if words == 0 {
            return 0.0;
        }
        words as f64 / self.words_per_second()
    }

    /// Estimated spoken duration of `text` in seconds. Zero for empty text.
    pub fn estimate_duration(&self, text: &str) -> f64 {
        self.estimate_for_words(word_count(text))
    }
}

/// Whitespace-separated word count. No punctuation or locale handling.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Duration at the default rate.
pub fn estimate_duration(text: &str) -> f64 {
    SpeakingRate::default().estimate_duration(text)
}
