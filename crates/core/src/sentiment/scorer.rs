//! Valence aggregation scorer.
//!
//! Per-token valences come from the lexicon and are adjusted by the up to
//! [`MODIFIER_WINDOW`](crate::config::MODIFIER_WINDOW) preceding tokens.
//! The raw sum is normalized to `compound` via `raw / sqrt(raw^2 + alpha)`.

use crate::config;
use crate::lexicon::{booster_scalar, is_negation, Lexicon};
use crate::sentiment::tokenizer::{is_all_caps, tokenize};
use crate::sentiment::SentimentScore;
use std::sync::Arc;

/// Scores text against a shared, immutable lexicon.
///
/// Cheap to clone; every clone shares the same lexicon.
#[derive(Debug, Clone)]
pub struct SentimentAnalyzer {
    lexicon: Arc<Lexicon>,
}

/// Per-call view of the tokenized text.
struct Sentence<'a> {
    words: Vec<&'a str>,
    lower: Vec<String>,
    cap_diff: bool,
}

impl SentimentAnalyzer {
    /// Creates an analyzer backed by the given lexicon.
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        Self { lexicon }
    }

    /// The lexicon this analyzer scores against.
    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// Scores `text`. Total: never fails, and text without any lexicon token
    /// (including the empty string) scores fully neutral.
    pub fn score(&self, text: &str) -> SentimentScore {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return SentimentScore::NEUTRAL;
        }

        let words: Vec<&str> = tokens.iter().collect();
        let lower: Vec<String> = words.iter().map(|w| w.to_lowercase()).collect();
        let caps = words.iter().filter(|w| is_all_caps(w)).count();
        let sentence = Sentence {
            cap_diff: caps > 0 && caps < words.len(),
            words,
            lower,
        };

        let mut sentiments = Vec::with_capacity(sentence.words.len());
        for i in 0..sentence.words.len() {
            let lw = sentence.lower[i].as_str();
            let is_kind_of =
                lw == "kind" && sentence.lower.get(i + 1).is_some_and(|next| next == "of");
            if booster_scalar(lw).is_some() || is_kind_of {
                sentiments.push(0.0);
                continue;
            }
            sentiments.push(self.valence_at(&sentence, i));
        }

        but_check(&sentence.lower, &mut sentiments);
        score_valence(&sentiments, text)
    }

    fn valence_at(&self, s: &Sentence<'_>, i: usize) -> f64 {
        let lw = s.lower[i].as_str();
        let Some(base) = self.lexicon.valence(lw) else {
            return 0.0;
        };
        let mut valence = base;

        // "no" used as a determiner ("no problems") carries no valence of its
        // own, but still takes caps and booster adjustments below.
        if lw == "no" && s.lower.get(i + 1).is_some_and(|next| self.lexicon.contains(next)) {
            valence = 0.0;
        }
        let preceded_by_no = (i > 0 && s.lower[i - 1] == "no")
            || (i > 1 && s.lower[i - 2] == "no")
            || (i > 2 && s.lower[i - 3] == "no" && matches!(s.lower[i - 1].as_str(), "or" | "nor"));
        if preceded_by_no {
            valence = base * config::N_SCALAR;
        }

        if s.cap_diff && is_all_caps(s.words[i]) {
            valence += if valence > 0.0 {
                config::C_INCR
            } else {
                -config::C_INCR
            };
        }

        for start in 0..config::MODIFIER_WINDOW {
            if i <= start {
                break;
            }
            let j = i - (start + 1);
            if self.lexicon.contains(&s.lower[j]) {
                continue;
            }
            let mut scalar = scalar_inc_dec(s.words[j], &s.lower[j], valence, s.cap_diff);
            match start {
                1 => scalar *= 0.95,
                2 => scalar *= 0.9,
                _ => {}
            }
            valence += scalar;
            valence = negation_check(valence, &s.lower, start, i);
        }

        self.least_check(valence, &s.lower, i)
    }

    /// "least" before a word flips it, except in "at least" / "very least".
    fn least_check(&self, valence: f64, lower: &[String], i: usize) -> f64 {
        if i == 0 || lower[i - 1] != "least" || self.lexicon.contains(&lower[i - 1]) {
            return valence;
        }
        if i > 1 && matches!(lower[i - 2].as_str(), "at" | "very") {
            return valence;
        }
        valence * config::N_SCALAR
    }
}

impl Default for SentimentAnalyzer {
    fn default() -> Self {
        Self::new(Arc::new(Lexicon::builtin()))
    }
}

/// Booster contribution of `word` towards a token with the given valence.
fn scalar_inc_dec(word: &str, word_lower: &str, valence: f64, cap_diff: bool) -> f64 {
    let Some(mut scalar) = booster_scalar(word_lower) else {
        return 0.0;
    };
    if valence < 0.0 {
        scalar = -scalar;
    }
    if cap_diff && is_all_caps(word) {
        scalar += if valence > 0.0 {
            config::C_INCR
        } else {
            -config::C_INCR
        };
    }
    scalar
}

/// Applies the negation rule for the token `start + 1` positions before `i`.
fn negation_check(valence: f64, lower: &[String], start: usize, i: usize) -> f64 {
    let is_so_this = |w: &str| matches!(w, "so" | "this");
    match start {
        0 if is_negation(&lower[i - 1]) => valence * config::N_SCALAR,
        1 if lower[i - 2] == "never" && is_so_this(lower[i - 1].as_str()) => {
            valence * config::NEVER_SO_SCALAR
        }
        1 if is_negation(&lower[i - 2]) => valence * config::N_SCALAR,
        2 if lower[i - 3] == "never"
            && (is_so_this(lower[i - 2].as_str()) || is_so_this(lower[i - 1].as_str())) =>
        {
            valence * config::NEVER_SO_SCALAR
        }
        2 if is_negation(&lower[i - 3]) => valence * config::N_SCALAR,
        _ => valence,
    }
}

/// Dampens sentiment before the first "but" and amplifies it after.
fn but_check(lower: &[String], sentiments: &mut [f64]) {
    let Some(bi) = lower.iter().position(|w| w == "but") else {
        return;
    };
    for (si, s) in sentiments.iter_mut().enumerate() {
        if si < bi {
            *s *= config::BUT_BEFORE_SCALAR;
        } else if si > bi {
            *s *= config::BUT_AFTER_SCALAR;
        }
    }
}

/// Extra magnitude from `!` and `?` runs.
fn punctuation_emphasis(text: &str) -> f64 {
    let exclamations = text.matches('!').count().min(config::MAX_EXCLAMATIONS);
    let ep = exclamations as f64 * config::EXCLAMATION_BOOST;

    let questions = text.matches('?').count();
    let qm = match questions {
        0 | 1 => 0.0,
        2 | 3 => questions as f64 * config::QUESTION_BOOST,
        _ => config::QUESTION_BOOST_CAP,
    };
    ep + qm
}

/// Maps a raw valence sum into `[-1, 1]`.
fn normalize(raw: f64) -> f64 {
    let norm = raw / (raw * raw + config::NORMALIZE_ALPHA).sqrt();
    norm.clamp(-1.0, 1.0)
}

fn score_valence(sentiments: &[f64], text: &str) -> SentimentScore {
    let punct = punctuation_emphasis(text);

    let mut raw: f64 = sentiments.iter().sum();
    if raw > 0.0 {
        raw += punct;
    } else if raw < 0.0 {
        raw -= punct;
    }
    let compound = if raw == 0.0 { 0.0 } else { normalize(raw) };

    let mut pos_sum = 0.0;
    let mut neg_sum = 0.0;
    let mut neu_count = 0.0;
    for &s in sentiments {
        if s > 0.0 {
            pos_sum += s + 1.0;
        } else if s < 0.0 {
            neg_sum += s - 1.0;
        } else {
            neu_count += 1.0;
        }
    }
    if pos_sum > neg_sum.abs() {
        pos_sum += punct;
    } else if pos_sum < neg_sum.abs() {
        neg_sum -= punct;
    }

    let total = pos_sum + neg_sum.abs() + neu_count;
    if total <= 0.0 {
        return SentimentScore::NEUTRAL;
    }
    SentimentScore {
        negative: (neg_sum / total).abs(),
        neutral: (neu_count / total).abs(),
        positive: (pos_sum / total).abs(),
        compound,
    }
}
