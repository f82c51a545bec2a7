//! Error type shared by the lexicon loader and the review store.

use std::io;

use thiserror::Error;

/// Error type for validation, lexicon, and persistence failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Caller supplied an unusable field. Never fatal.
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("review snapshot error: {0}")]
    Csv(#[from] csv::Error),
    /// The durable record parsed but violates an invariant.
    #[error("corrupt review record: {0}")]
    Corrupt(String),
    #[error("lexicon error: {0}")]
    Lexicon(String),
}

impl StoreError {
    /// Returns `true` for errors caused by the caller rather than the store.
    pub fn is_validation(&self) -> bool {
        matches!(self, StoreError::Validation(_))
    }
}

/// Result type alias for store and lexicon operations.
pub type Result<T> = std::result::Result<T, StoreError>;
