//! Lexicon-based sentiment scoring.
//!
//! [`SentimentAnalyzer::score`] turns arbitrary text into a [`SentimentScore`]
//! using valence aggregation over a [`Lexicon`](crate::lexicon::Lexicon):
//! negation, booster words, ALL-CAPS emphasis, "but" contrast, and
//! punctuation emphasis all adjust the per-token valences before they are
//! summed and normalized.

/// Valence aggregation and normalization.
pub mod scorer;
/// Whitespace tokenizer preserving case and emoticons.
pub mod tokenizer;

pub use scorer::SentimentAnalyzer;

use serde::{Deserialize, Serialize};

/// Sentiment of a piece of text.
///
/// `negative + neutral + positive` is 1.0 within floating tolerance and
/// `compound` lies in `[-1, 1]`. Derived on demand, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentScore {
    pub negative: f64,
    pub neutral: f64,
    pub positive: f64,
    /// Normalized aggregate polarity.
    pub compound: f64,
}

impl SentimentScore {
    /// Score of text carrying no sentiment at all.
    pub const NEUTRAL: SentimentScore = SentimentScore {
        negative: 0.0,
        neutral: 1.0,
        positive: 0.0,
        compound: 0.0,
    };
}

impl Default for SentimentScore {
    fn default() -> Self {
        Self::NEUTRAL
    }
}
