//! # reviewlens-core
//!
//! Review-processing engine: lexicon-based sentiment scoring, predicate
//! filtering with sentiment ranking, and an append-only review store.
//!
//! This is the core library crate with zero async dependencies. The HTTP
//! layer lives in `reviewlens-server`.
//!
//! ```text
//! Lexicon → SentimentAnalyzer ─┐
//! ReviewStore::snapshot() ─────┴→ query::rank → ranked (Review, SentimentScore)
//! ReviewStore::append → WAL (CRC32 + fsync) → in-memory commit
//! Compaction: CSV snapshot (temp + rename) → WAL truncate
//! ```

/// Global configuration constants: scoring parameters, limits, defaults.
pub mod config;
/// Error taxonomy for lexicon loading and storage.
pub mod error;
/// Lexicon store: token valences and modifier word sets.
pub mod lexicon;
/// Filtering and sentiment ranking over review snapshots.
pub mod query;
/// The `Review` record and timestamp helpers.
pub mod review;
/// Lexicon-based sentiment scorer.
pub mod sentiment;
/// Storage layer: review store, write-ahead log, and CSV snapshots.
pub mod storage;

pub use error::{Result, StoreError};
pub use review::Review;
