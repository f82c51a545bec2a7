//! Request and response data transfer objects for the REST API.
//!
//! All types derive `Serialize` and/or `Deserialize` for JSON marshalling via Axum.

use reviewlens_core::query::ScoredReview;
use reviewlens_core::sentiment::SentimentScore;
use reviewlens_core::Review;
use serde::{Deserialize, Serialize};

// Query parameters for the listing routes.
pub use reviewlens_core::query::ReviewFilter;

/// Request body for `POST /reviews`, form-encoded or JSON.
///
/// Accepts both the lowercase field names and the `Location` / `ReviewBody`
/// names used by the CSV record. Fields are optional here so that missing
/// values reach validation and produce a 400 with a readable reason.
#[derive(Debug, Default, Deserialize)]
pub struct CreateReviewRequest {
    #[serde(default, alias = "Location")]
    pub location: Option<String>,
    #[serde(default, alias = "ReviewBody")]
    pub body: Option<String>,
}

/// A review as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewResponse {
    pub id: String,
    pub location: String,
    pub body: String,
    pub timestamp: String,
}

impl From<&Review> for ReviewResponse {
    fn from(review: &Review) -> Self {
        Self {
            id: review.id.clone(),
            location: review.location.clone(),
            body: review.body.clone(),
            timestamp: review.timestamp.clone(),
        }
    }
}

impl From<Review> for ReviewResponse {
    fn from(review: Review) -> Self {
        Self {
            id: review.id,
            location: review.location,
            body: review.body,
            timestamp: review.timestamp,
        }
    }
}

/// A review with its embedded sentiment, as returned by ranked listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredReviewResponse {
    #[serde(flatten)]
    pub review: ReviewResponse,
    pub sentiment: SentimentScore,
}

impl From<ScoredReview> for ScoredReviewResponse {
    fn from(scored: ScoredReview) -> Self {
        Self {
            review: scored.review.into(),
            sentiment: scored.sentiment,
        }
    }
}

/// Response body for `GET /health`.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub reviews: usize,
    pub wal_size_bytes: u64,
}

/// Response body for `POST /admin/compact`.
#[derive(Debug, Serialize, Deserialize)]
pub struct CompactResponse {
    pub reviews: usize,
}
