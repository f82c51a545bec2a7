//! Core review type for reviewlens.
//!
//! A `Review` is an immutable record with an opaque unique ID, a location
//! category, free-text body, and a creation timestamp in the fixed
//! `YYYY-MM-DD HH:MM:SS` format (see [`crate::config::TIMESTAMP_FORMAT`]).

use crate::config;
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored customer review.
///
/// Fields are never mutated after creation. Sentiment is not stored here; it
/// is recomputed from `body` on every query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    /// Unique identifier. New reviews get a UUID v4; loaded reviews keep theirs.
    pub id: String,
    /// Free-text category, equality-matched by filters.
    pub location: String,
    /// Review text, sole input to the sentiment scorer.
    pub body: String,
    /// Creation time, `YYYY-MM-DD HH:MM:SS`.
    pub timestamp: String,
}

impl Review {
    /// Creates a new review with a random UUID and the given timestamp.
    pub fn new(location: String, body: String, timestamp: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            location,
            body,
            timestamp,
        }
    }

    /// Creates a review with a specific ID.
    pub fn with_id(id: String, location: String, body: String, timestamp: String) -> Self {
        Self {
            id,
            location,
            body,
            timestamp,
        }
    }
}

/// Current local wall-clock time in the review timestamp format.
pub fn now_timestamp() -> String {
    Local::now().format(config::TIMESTAMP_FORMAT).to_string()
}

/// Returns `true` if `ts` is a well-formed review timestamp.
pub fn is_valid_timestamp(ts: &str) -> bool {
    ts.len() == 19 && NaiveDateTime::parse_from_str(ts, config::TIMESTAMP_FORMAT).is_ok()
}
