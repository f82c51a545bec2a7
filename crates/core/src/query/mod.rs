//! Query engine: filter a review snapshot, score each match, rank by sentiment.
//!
//! Queries never mutate their input and never retain the snapshot; the
//! result is a fresh vector.

/// Location and timestamp-range predicates.
pub mod filter;

pub use filter::ReviewFilter;

use crate::review::Review;
use crate::sentiment::{SentimentAnalyzer, SentimentScore};

/// A review paired with the sentiment of its body.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredReview {
    pub review: Review,
    pub sentiment: SentimentScore,
}

/// Filters `reviews`, scores every match, and sorts by compound descending.
///
/// The sort is stable: reviews with equal compound keep their insertion order.
pub fn rank(
    reviews: &[Review],
    filter: &ReviewFilter,
    analyzer: &SentimentAnalyzer,
) -> Vec<ScoredReview> {
    let mut results: Vec<ScoredReview> = reviews
        .iter()
        .filter(|r| filter.matches(r))
        .map(|r| ScoredReview {
            sentiment: analyzer.score(&r.body),
            review: r.clone(),
        })
        .collect();
    results.sort_by(|a, b| b.sentiment.compound.total_cmp(&a.sentiment.compound));
    results
}
