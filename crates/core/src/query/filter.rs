//! Review filter predicates.
//!
//! A [`ReviewFilter`] holds three independently optional predicates. An
//! absent predicate always passes. Timestamps are compared lexically, which
//! matches chronological order for the fixed `YYYY-MM-DD HH:MM:SS` format;
//! a bare date such as `2024-01-02` therefore works as a start bound but, as
//! an end bound, excludes reviews later on that same day.

use crate::review::Review;
use serde::Deserialize;

/// Location and timestamp-range filter over reviews.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
pub struct ReviewFilter {
    /// Exact location match.
    #[serde(default)]
    pub location: Option<String>,
    /// Inclusive lower timestamp bound.
    #[serde(default, alias = "start_date")]
    pub start: Option<String>,
    /// Inclusive upper timestamp bound.
    #[serde(default, alias = "end_date")]
    pub end: Option<String>,
}

impl ReviewFilter {
    /// Filter on location only.
    pub fn location(location: impl Into<String>) -> Self {
        Self {
            location: Some(location.into()),
            ..Self::default()
        }
    }

    /// Returns `true` if no predicate is set.
    pub fn is_empty(&self) -> bool {
        self.location.is_none() && self.start.is_none() && self.end.is_none()
    }

    /// Drops predicates whose value is blank, so `?location=` constrains nothing.
    pub fn without_blanks(self) -> Self {
        let keep = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        Self {
            location: keep(self.location),
            start: keep(self.start),
            end: keep(self.end),
        }
    }

    /// Check if a review satisfies every set predicate.
    pub fn matches(&self, review: &Review) -> bool {
        if let Some(ref location) = self.location {
            if review.location != *location {
                return false;
            }
        }
        if let Some(ref start) = self.start {
            if review.timestamp.as_str() < start.as_str() {
                return false;
            }
        }
        if let Some(ref end) = self.end {
            if review.timestamp.as_str() > end.as_str() {
                return false;
            }
        }
        true
    }
}
