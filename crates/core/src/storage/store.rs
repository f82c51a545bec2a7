//! The review store: sole owner of the authoritative review collection.
//!
//! Readers take an immutable [`snapshot`](ReviewStore::snapshot); the single
//! writer appends through the WAL and only then publishes the new review, so
//! a failed write never becomes visible and readers never see a partial
//! append.

use crate::config;
use crate::error::{Result, StoreError};
use crate::review::{now_timestamp, Review};
use crate::storage::persistence::{load_snapshot, save_snapshot};
use crate::storage::wal::{ReplayStats, SyncWriteAheadLog, WalEntry};
use parking_lot::{Mutex, RwLock};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

/// Startup behavior of [`ReviewStore::open`].
#[derive(Debug, Clone, Copy)]
pub struct StoreOptions {
    /// Refuse to start when the WAL has CRC mismatches or undecodable entries.
    /// A truncated final entry is always tolerated.
    pub wal_strict: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self { wal_strict: true }
    }
}

/// State only the writer touches.
struct WriterState {
    ids: HashSet<String>,
    latest_timestamp: Option<String>,
}

/// Append-only, durably persisted review collection.
pub struct ReviewStore {
    data_dir: PathBuf,
    reviews: RwLock<Arc<Vec<Review>>>,
    writer: Mutex<WriterState>,
    wal: SyncWriteAheadLog,
}

impl ReviewStore {
    /// Loads the collection from `data_dir`: the CSV snapshot, then any WAL
    /// entries written since the last compaction.
    ///
    /// If the WAL held anything, the store is compacted before returning so
    /// the next run starts from a clean snapshot.
    pub fn open(data_dir: impl AsRef<Path>, options: StoreOptions) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        let mut reviews = load_snapshot(&data_dir)?;
        let wal = SyncWriteAheadLog::new(&data_dir)?;

        let (entries, stats) = wal.replay()?;
        check_replay(&stats, options)?;

        let mut ids: HashSet<String> = reviews.iter().map(|r| r.id.clone()).collect();
        let mut replayed = 0usize;
        for entry in entries {
            match entry {
                WalEntry::AppendReview { review } => {
                    // Already folded into the snapshot by an interrupted compaction.
                    if !ids.insert(review.id.clone()) {
                        tracing::debug!(review_id = %review.id, "WAL entry already in snapshot");
                        continue;
                    }
                    reviews.push(review);
                    replayed += 1;
                }
            }
        }
        if replayed > 0 {
            tracing::info!("Replayed {} reviews from WAL", replayed);
        }

        let latest_timestamp = reviews.iter().map(|r| r.timestamp.clone()).max();
        let store = Self {
            data_dir,
            reviews: RwLock::new(Arc::new(reviews)),
            writer: Mutex::new(WriterState {
                ids,
                latest_timestamp,
            }),
            wal,
        };

        if store.wal.size_bytes() > 0 {
            store.compact()?;
        }
        Ok(store)
    }

    /// Creates a review, persists it, and publishes it.
    ///
    /// Both fields must be non-blank. The new review gets a fresh UUID and a
    /// timestamp no earlier than any review already stored. The WAL entry is
    /// fsynced before the review enters memory; on failure the collection is
    /// unchanged.
    pub fn append(&self, location: &str, body: &str) -> Result<Review> {
        validate_fields(location, body)?;

        let mut writer = self.writer.lock();
        let mut timestamp = now_timestamp();
        if let Some(latest) = writer.latest_timestamp.as_ref() {
            if timestamp < *latest {
                timestamp.clone_from(latest);
            }
        }
        let mut review = Review::new(location.to_string(), body.to_string(), timestamp);
        while writer.ids.contains(&review.id) {
            review.id = Uuid::new_v4().to_string();
        }

        self.wal.append(&WalEntry::AppendReview {
            review: review.clone(),
        })?;

        writer.ids.insert(review.id.clone());
        writer.latest_timestamp = Some(review.timestamp.clone());
        Arc::make_mut(&mut *self.reviews.write()).push(review.clone());

        tracing::debug!(review_id = %review.id, location = %review.location, "Review appended");
        Ok(review)
    }

    /// Point-in-time view of the collection in insertion order.
    pub fn snapshot(&self) -> Arc<Vec<Review>> {
        Arc::clone(&self.reviews.read())
    }

    /// Rewrites the CSV snapshot from memory and truncates the WAL.
    ///
    /// Appends are blocked for the duration. Returns the number of reviews
    /// written.
    pub fn compact(&self) -> Result<usize> {
        let _writer = self.writer.lock();
        let reviews = self.snapshot();
        save_snapshot(&reviews, &self.data_dir)?;
        self.wal.truncate()?;
        tracing::info!(reviews = reviews.len(), "Compaction complete, WAL truncated");
        Ok(reviews.len())
    }

    /// Number of reviews.
    pub fn len(&self) -> usize {
        self.reviews.read().len()
    }

    /// Returns `true` if the store holds no reviews.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes currently held in the WAL (appends since the last compaction).
    pub fn wal_size_bytes(&self) -> u64 {
        self.wal.size_bytes()
    }

    /// Directory holding the snapshot and WAL.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

fn check_replay(stats: &ReplayStats, options: StoreOptions) -> Result<()> {
    if stats.truncated {
        tracing::warn!("WAL ends in a partial entry; it will be dropped");
    }
    if !stats.has_corruption() {
        return Ok(());
    }
    tracing::warn!(
        "WAL replay stats: {} ok, {} skipped, {} CRC errors, {} bad frame lengths, truncated={}",
        stats.success,
        stats.skipped,
        stats.crc_errors,
        stats.bad_frames,
        stats.truncated
    );
    if options.wal_strict {
        return Err(StoreError::Corrupt(format!(
            "WAL replay encountered {} CRC errors, {} bad frame lengths and {} undecodable entries",
            stats.crc_errors, stats.bad_frames, stats.skipped
        )));
    }
    Ok(())
}

fn validate_fields(location: &str, body: &str) -> Result<()> {
    if location.trim().is_empty() || body.trim().is_empty() {
        return Err(StoreError::Validation(
            "Location and ReviewBody are required fields".into(),
        ));
    }
    if location.len() > config::MAX_LOCATION_LEN {
        return Err(StoreError::Validation(format!(
            "Location exceeds maximum length of {} bytes",
            config::MAX_LOCATION_LEN
        )));
    }
    if body.len() > config::MAX_BODY_LEN {
        return Err(StoreError::Validation(format!(
            "ReviewBody exceeds maximum length of {} bytes",
            config::MAX_BODY_LEN
        )));
    }
    Ok(())
}
