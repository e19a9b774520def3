//! Sentiment scoring: pluggable, trait-based scorer plus the fixed three-way labeling rule.
//!
//! Default: `LexiconAnalyzer` (pure-Rust, deterministic, no network).
//! `AppState` holds an `Arc<dyn SentimentAnalyzer>`.

pub mod handlers;
pub mod lexicon;

use serde::Serialize;

pub const POSITIVE_THRESHOLD: f64 = 0.1;
pub const NEGATIVE_THRESHOLD: f64 = -0.1;

/// Raw scores from an analyzer backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SentimentScores {
    /// -1.0 (most negative) to 1.0 (most positive).
    pub polarity: f64,
    /// 0.0 (objective) to 1.0 (subjective).
    pub subjectivity: f64,
}

pub trait SentimentAnalyzer: Send + Sync {
    fn analyze(&self, text: &str) -> SentimentScores;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

/// Buckets a polarity score. Both thresholds are exclusive.
pub fn classify(polarity: f64) -> SentimentLabel {
    if polarity > POSITIVE_THRESHOLD {
        SentimentLabel::Positive
    } else if polarity < NEGATIVE_THRESHOLD {
        SentimentLabel::Negative
    } else {
        SentimentLabel::Neutral
    }
}

/// Rounds half away from zero to three decimal places.
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_thresholds_are_exclusive() {
        assert_eq!(classify(0.1), SentimentLabel::Neutral);
        assert_eq!(classify(-0.1), SentimentLabel::Neutral);
        assert_eq!(classify(0.0), SentimentLabel::Neutral);
        assert_eq!(classify(0.1001), SentimentLabel::Positive);
        assert_eq!(classify(-0.1001), SentimentLabel::Negative);
        assert_eq!(classify(1.0), SentimentLabel::Positive);
        assert_eq!(classify(-1.0), SentimentLabel::Negative);
    }

    #[test]
    fn test_label_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&SentimentLabel::Positive).unwrap(),
            "\"positive\""
        );
    }

    #[test]
    fn test_round3() {
        assert_eq!(round3(0.65), 0.65);
        assert_eq!(round3(0.123456), 0.123);
        assert_eq!(round3(-0.98765), -0.988);
        assert_eq!(round3(0.0), 0.0);
    }
}
