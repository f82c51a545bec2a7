//! Modifier word sets: negations and booster/dampener scalars.

use crate::config::{B_DECR, B_INCR};
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

static NEGATIONS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "aint", "arent", "cannot", "cant", "couldnt", "darent", "didnt", "doesnt", "ain't",
        "aren't", "can't", "couldn't", "daren't", "didn't", "doesn't", "dont", "hadnt", "hasnt",
        "havent", "isnt", "mightnt", "mustnt", "neither", "don't", "hadn't", "hasn't", "haven't",
        "isn't", "mightn't", "mustn't", "neednt", "needn't", "never", "none", "nope", "nor",
        "not", "nothing", "nowhere", "oughtnt", "shant", "shouldnt", "uhuh", "wasnt", "werent",
        "oughtn't", "shan't", "shouldn't", "uh-uh", "wasn't", "weren't", "without", "wont",
        "wouldnt", "won't", "wouldn't", "rarely", "seldom", "despite",
    ]
    .into_iter()
    .collect()
});

static BOOSTERS: LazyLock<HashMap<&'static str, f64>> = LazyLock::new(|| {
    let incr = [
        "absolutely", "amazingly", "awfully", "completely", "considerable", "considerably",
        "decidedly", "deeply", "effing", "enormous", "enormously", "entirely", "especially",
        "exceptional", "exceptionally", "extreme", "extremely", "fabulously", "flipping",
        "flippin", "frackin", "fracking", "fricking", "frickin", "frigging", "friggin", "fully",
        "fuckin", "fucking", "fuggin", "fugging", "greatly", "hella", "highly", "hugely",
        "incredible", "incredibly", "intensely", "major", "majorly", "more", "most",
        "particularly", "purely", "quite", "really", "remarkably", "so", "substantially",
        "thoroughly", "total", "totally", "tremendous", "tremendously", "uber", "unbelievably",
        "unusually", "utter", "utterly", "very",
    ];
    let decr = [
        "almost", "barely", "hardly", "just enough", "kind of", "kinda", "kindof", "kind-of",
        "less", "little", "marginal", "marginally", "occasional", "occasionally", "partly",
        "scarce", "scarcely", "slight", "slightly", "somewhat", "sort of", "sorta", "sortof",
        "sort-of",
    ];
    incr.into_iter()
        .map(|w| (w, B_INCR))
        .chain(decr.into_iter().map(|w| (w, B_DECR)))
        .collect()
});

/// Returns `true` if the lowercase word negates what follows it.
///
/// Any contraction ending in `n't` counts, so the explicit list only needs
/// the apostrophe-less spellings.
pub fn is_negation(word_lower: &str) -> bool {
    NEGATIONS.contains(word_lower) || word_lower.contains("n't")
}

/// Booster (positive) or dampener (negative) scalar for a lowercase word.
pub fn booster_scalar(word_lower: &str) -> Option<f64> {
    BOOSTERS.get(word_lower).copied()
}
